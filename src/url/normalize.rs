use crate::UrlError;
use url::Url;

/// Query parameters that never change page content
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "msclkid"];

/// Normalizes a target URL taken from the input table
///
/// # Normalization Steps
///
/// 1. Trim whitespace; a bare host (`acme.com`) gets the `https://` scheme
/// 2. Parse the URL; reject if malformed
/// 3. Only `http` and `https` are accepted
/// 4. The host must be present and contain a dot (`localhost`-style names are rejected)
/// 5. Normalize path: remove dot segments and duplicate slashes; empty path becomes /
/// 6. Remove fragment and tracking query parameters
///
/// The `www.` prefix is kept: the request goes to the host the lead list names.
///
/// # Examples
///
/// ```
/// use contact_miner::url::normalize_target_url;
///
/// let url = normalize_target_url("  Acme.COM ").unwrap();
/// assert_eq!(url.as_str(), "https://acme.com/");
///
/// let url = normalize_target_url("http://www.acme.com/about/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "http://www.acme.com/about/");
/// ```
pub fn normalize_target_url(raw: &str) -> Result<Url, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty value".to_string()));
    }

    let with_scheme = if trimmed.contains("://") || has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches('/'))
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    if !host.contains('.') && !host.starts_with('[') {
        return Err(UrlError::Malformed(format!("host '{}' is not a domain", host)));
    }
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let kept = filter_query_params(&url);
        if kept.is_empty() {
            url.set_query(None);
        } else {
            // Re-encodes the decoded pairs, so `%26` inside a value stays a literal `&`
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    Ok(url)
}

/// Returns true for `scheme:rest` values such as `mailto:x@y.z`
///
/// `host:port` is not a scheme: the part after the colon starts with a digit.
fn has_scheme(value: &str) -> bool {
    match value.split_once(':') {
        Some((prefix, rest)) => {
            !prefix.is_empty()
                && prefix.chars().all(|c| c.is_ascii_alphabetic())
                && !rest.starts_with(|c: char| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Resolves a URL found on a site (sitemap entry, guessed path) against the site
///
/// Returns None for non-HTTP(S) results and unparseable values.
pub fn resolve_on_site(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Normalizes a URL path by removing dot segments and duplicate slashes
///
/// A trailing slash is preserved; many sites serve `/contact/` but 404 on `/contact`.
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", normalized_segments.join("/"));
    if path.ends_with('/') {
        result.push('/');
    }
    result
}

/// Drops tracking parameters, keeping the remaining order
fn filter_query_params(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

use url::Url;

/// Returns the host with a leading `www.` removed
fn bare_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(rest) => rest.to_string(),
            None => host,
        }
    })
}

/// Derives the checkpoint identifier of a target
///
/// The identifier is the host without `www.`, plus the port when it is not
/// the scheme default. Two input rows naming the same site collapse onto one
/// identifier, so a site is never processed twice in one run.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use contact_miner::url::target_id;
///
/// let url = Url::parse("https://www.Acme.com/about").unwrap();
/// assert_eq!(target_id(&url), Some("acme.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(target_id(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn target_id(url: &Url) -> Option<String> {
    let host = bare_host(url)?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Returns the registrable-looking domain used for email matching
///
/// This is the bare host; no public-suffix list is consulted.
pub fn email_domain(url: &Url) -> Option<String> {
    bare_host(url)
}

//! Email extraction and validation

use crate::extract::text::visible_text_of;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;

/// Pages yielding more unique emails than this are treated as mis-scrapes
pub const DEFAULT_MAX_EMAILS_PER_PAGE: usize = 20;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email pattern")
});

static VALID_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9._%+-]{1,64}@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,24}$")
        .expect("valid email validator")
});

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Non-personal mailboxes, matched as the whole local part or its first word
const DENIED_LOCAL_PREFIXES: &[&str] = &[
    "noreply",
    "no-reply",
    "no_reply",
    "donotreply",
    "do-not-reply",
    "webmaster",
    "postmaster",
    "hostmaster",
    "abuse",
    "mailer-daemon",
    "bounce",
    "bounces",
    "unsubscribe",
];

/// Local parts used in templates and form placeholders
const PLACEHOLDER_LOCALS: &[&str] = &[
    "you",
    "your",
    "yourname",
    "your.name",
    "name",
    "email",
    "user",
    "username",
    "firstname.lastname",
    "john.doe",
    "jane.doe",
];

/// Placeholder and tooling domains that never belong to a lead
const PLACEHOLDER_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "test.com",
    "domain.com",
    "yourdomain.com",
    "yoursite.com",
    "email.com",
    "sentry.io",
    "wixpress.com",
];

/// "TLDs" that are really file extensions (`logo@2x.png`)
const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "css", "js", "woff", "woff2",
    "ttf", "pdf", "mp4",
];

/// Role prefixes preferred when picking a primary email, best first
const PREFERRED_ROLES: &[&str] = &["info", "contact", "hello", "sales", "office"];

/// Extracts validated emails from an HTML page
///
/// Two passes are unioned: a regex scan of the visible text and a scan of
/// `mailto:` anchors. Results are lower-cased and validated with
/// [`is_valid_email`]. A page with more than `max_emails` unique addresses
/// is a mis-scrape (directory listing, captured boilerplate) and yields an
/// empty set.
///
/// # Example
///
/// ```
/// use contact_miner::extract::extract_emails;
///
/// let html = r#"<a href="mailto:info@Acme.COM?subject=Hi">Mail us</a>"#;
/// let emails = extract_emails(html, 20);
/// assert_eq!(emails.into_iter().collect::<Vec<_>>(), vec!["info@acme.com"]);
/// ```
pub fn extract_emails(html: &str, max_emails: usize) -> BTreeSet<String> {
    let document = Html::parse_document(html);
    let text = visible_text_of(&document);
    extract_emails_of(&document, &text, max_emails)
}

pub(crate) fn extract_emails_of(
    document: &Html,
    visible_text: &str,
    max_emails: usize,
) -> BTreeSet<String> {
    let mut found = BTreeSet::new();

    for candidate in EMAIL_PATTERN.find_iter(visible_text) {
        found.insert(candidate.as_str().to_lowercase());
    }

    for element in document.select(&ANCHOR_SELECTOR) {
        if let Some(href) = element.value().attr("href") {
            found.extend(mailto_addresses(href));
        }
    }

    let valid: BTreeSet<String> = found
        .into_iter()
        .map(|email| email.trim_matches('.').to_string())
        .filter(|email| is_valid_email(email))
        .collect();

    if valid.len() > max_emails {
        tracing::debug!(
            "Discarding {} emails from one page as a mis-scrape (limit {})",
            valid.len(),
            max_emails
        );
        return BTreeSet::new();
    }

    valid
}

/// Returns the lower-cased addresses of a `mailto:` href
fn mailto_addresses(href: &str) -> Vec<String> {
    let href = href.trim();
    match href.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => {}
        _ => return Vec::new(),
    }

    let recipients = href[7..].split('?').next().unwrap_or("");
    recipients
        .replace("%40", "@")
        .replace("%20", " ")
        .split(',')
        .map(|address| address.trim().to_lowercase())
        .filter(|address| !address.is_empty())
        .collect()
}

/// Validates a lower-cased email address
///
/// Rejects malformed addresses, lengths outside 6..=254, non-personal
/// mailboxes (`noreply@`, `webmaster@`, ...), placeholder addresses and
/// domains, and image/asset names that merely look like addresses.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 6 || email.len() > 254 {
        return false;
    }

    if !VALID_EMAIL.is_match(email) {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    if is_denied_local(local) {
        return false;
    }

    if PLACEHOLDER_LOCALS.contains(&local) {
        return false;
    }

    if PLACEHOLDER_DOMAINS
        .iter()
        .any(|placeholder| domain == *placeholder || domain.ends_with(&format!(".{}", placeholder)))
    {
        return false;
    }

    let tld = domain.rsplit('.').next().unwrap_or("");
    !ASSET_EXTENSIONS.contains(&tld)
}

/// Returns true for `abuse`, `abuse-desk` or `noreply+id`, never for `abusefree`
fn is_denied_local(local: &str) -> bool {
    DENIED_LOCAL_PREFIXES.iter().any(|prefix| match local.strip_prefix(prefix) {
        Some(rest) => {
            rest.is_empty() || rest.starts_with(|c: char| matches!(c, '-' | '.' | '_' | '+'))
        }
        None => false,
    })
}

/// Orders emails best first
///
/// Addresses on the site's own domain come first, then preferred role
/// mailboxes (`info@`, `contact@`, ...), then lexical order.
pub fn rank_emails<I>(emails: I, site_domain: Option<&str>) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut ranked: Vec<String> = emails.into_iter().collect();
    ranked.sort_by_cached_key(|email| {
        let (local, domain) = email.rsplit_once('@').unwrap_or((email.as_str(), ""));
        let on_site = site_domain.map_or(false, |site| {
            domain == site || domain.ends_with(&format!(".{}", site))
        });
        let role = PREFERRED_ROLES
            .iter()
            .position(|r| *r == local)
            .unwrap_or(PREFERRED_ROLES.len());
        (!on_site, role, email.clone())
    });
    ranked.dedup();
    ranked
}

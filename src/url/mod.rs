//! URL handling module for Contact-Miner
//!
//! This module provides target URL normalization, site roots, target
//! identifiers and email domains.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{email_domain, target_id};
pub use normalize::{normalize_target_url, resolve_on_site};

use url::Url;

/// Returns the root of the site a URL belongs to
///
/// The root keeps scheme, host and port and drops path, query and fragment.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use contact_miner::url::site_root;
///
/// let url = Url::parse("https://acme.com/pages/contact?x=1").unwrap();
/// assert_eq!(site_root(&url).as_str(), "https://acme.com/");
/// ```
pub fn site_root(url: &Url) -> Url {
    let mut root = url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}

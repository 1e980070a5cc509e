//! Sitemap and sitemap index parsing

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Errors raised while parsing a sitemap
///
/// Callers treat every variant as "no sitemap found".
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("document root is <{0}>, not a sitemap")]
    NotASitemap(String),

    #[error("document is empty")]
    Empty,
}

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of child sitemaps
    Index(Vec<String>),

    /// `<urlset>`: page locations
    UrlSet(Vec<String>),
}

/// Parses a sitemap or sitemap index into its `<loc>` values
///
/// Only the document root decides the kind; `<loc>` values are collected in
/// document order. HTML served at a sitemap path (a common soft 404) is
/// rejected as [`SitemapError::NotASitemap`].
///
/// # Example
///
/// ```
/// use contact_miner::discovery::{parse_sitemap, SitemapDocument};
///
/// let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://acme.test/contact-us</loc></url>
/// </urlset>"#;
/// assert_eq!(
///     parse_sitemap(xml).unwrap(),
///     SitemapDocument::UrlSet(vec!["https://acme.test/contact-us".to_string()])
/// );
/// ```
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut root: Option<String> = None;
    let mut in_loc = false;
    let mut current_loc = String::new();
    let mut locations = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
                if root.is_none() {
                    root = Some(name.clone());
                }
                if name == "loc" {
                    in_loc = true;
                    current_loc.clear();
                }
            }
            Event::Empty(e) => {
                if root.is_none() {
                    root = Some(
                        String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase(),
                    );
                }
            }
            Event::Text(e) if in_loc => {
                let text = e.unescape().unwrap_or_default();
                current_loc.push_str(text.trim());
            }
            Event::CData(e) if in_loc => {
                current_loc.push_str(String::from_utf8_lossy(&e.into_inner()).trim());
            }
            Event::End(e) => {
                if e.local_name().as_ref().eq_ignore_ascii_case(b"loc") {
                    in_loc = false;
                    if !current_loc.is_empty() {
                        locations.push(std::mem::take(&mut current_loc));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    match root.as_deref() {
        Some("sitemapindex") => Ok(SitemapDocument::Index(locations)),
        Some("urlset") => Ok(SitemapDocument::UrlSet(locations)),
        Some(other) => Err(SitemapError::NotASitemap(other.to_string())),
        None => Err(SitemapError::Empty),
    }
}

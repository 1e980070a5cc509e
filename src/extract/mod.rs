//! Content extraction from fetched HTML
//!
//! This module turns raw HTML into contact signals:
//! - Clean, bounded plain text
//! - Validated, denylisted email addresses (text and `mailto:` passes)
//! - North-American phone numbers
//! - A static/dynamic rendering classification

mod email;
mod phone;
mod site_type;
mod text;

pub use email::{extract_emails, is_valid_email, rank_emails, DEFAULT_MAX_EMAILS_PER_PAGE};
pub use phone::extract_phones;
pub use site_type::{classify_site_type, DEFAULT_DYNAMIC_TEXT_THRESHOLD};
pub use text::{clean_text, visible_text};
pub(crate) use text::truncate_chars;

use crate::config::Config;
use crate::model::SiteType;
use scraper::Html;
use std::collections::BTreeSet;

/// Limits applied while extracting one page
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub max_text_chars: usize,
    pub max_emails_per_page: usize,
    pub dynamic_text_threshold: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_text_chars: 5000,
            max_emails_per_page: DEFAULT_MAX_EMAILS_PER_PAGE,
            dynamic_text_threshold: DEFAULT_DYNAMIC_TEXT_THRESHOLD,
        }
    }
}

impl From<&Config> for ExtractOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_text_chars: config.scrape.max_text_chars,
            max_emails_per_page: config.scrape.max_emails_per_page,
            dynamic_text_threshold: config.fetch.dynamic_text_threshold,
        }
    }
}

/// Everything extracted from one fetched page
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub emails: BTreeSet<String>,
    pub phones: BTreeSet<String>,
    pub text: String,
    pub site_type: SiteType,
}

impl ExtractionResult {
    pub fn has_emails(&self) -> bool {
        !self.emails.is_empty()
    }
}

/// Extracts emails, phones, clean text and site type from a page
///
/// The document is parsed once and shared by all extractors.
///
/// # Example
///
/// ```
/// use contact_miner::extract::{extract_page, ExtractOptions};
///
/// let html = r#"<html><body><p>Call 612-555-0199</p>
///     <a href="mailto:hello@acme.test">Email</a></body></html>"#;
/// let page = extract_page(html, &ExtractOptions::default());
/// assert!(page.emails.contains("hello@acme.test"));
/// assert!(page.phones.contains("612-555-0199"));
/// ```
pub fn extract_page(html: &str, options: &ExtractOptions) -> ExtractionResult {
    let document = Html::parse_document(html);
    let visible = text::visible_text_of(&document);

    let emails = email::extract_emails_of(&document, &visible, options.max_emails_per_page);
    let phones = extract_phones(&visible);
    let site_type = if html.trim().is_empty() {
        SiteType::Unknown
    } else {
        site_type::classify_document(
            html,
            &document,
            visible.chars().count(),
            options.dynamic_text_threshold,
        )
    };
    let text = text::clean_text_of(&document, options.max_text_chars);

    ExtractionResult {
        emails,
        phones,
        text,
        site_type,
    }
}

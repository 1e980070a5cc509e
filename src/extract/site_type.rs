//! Static versus client-rendered site classification

use crate::extract::text::visible_text_of;
use crate::model::SiteType;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// Default visible-text length below which a page is considered a shell
pub const DEFAULT_DYNAMIC_TEXT_THRESHOLD: usize = 200;

static MOUNT_POINT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("#root, #app, #__next, #__nuxt, #___gatsby, app-root, [data-reactroot]")
        .expect("valid mount point selector")
});

static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("valid script selector"));

/// Substrings of script sources and inline scripts that betray an SPA framework
const FRAMEWORK_MARKERS: &[&str] = &[
    "/_next/static",
    "__next_data__",
    "window.__nuxt__",
    "/_nuxt/",
    "react-dom",
    "react.production",
    "vue.runtime",
    "vue.global",
    "angular",
    "ember",
    "/static/js/main.",
    "svelte",
];

/// Classifies a page as statically or dynamically rendered
///
/// A page is `dynamic` when it has an empty SPA mount point, when its
/// visible text is shorter than `text_threshold`, or when it references an
/// SPA framework and its visible text is still thin (under twice the
/// threshold). Otherwise it is `static` if it has basic HTML structure and
/// `unknown` if not (empty or non-HTML bodies).
pub fn classify_site_type(html: &str, text_threshold: usize) -> SiteType {
    if html.trim().is_empty() {
        return SiteType::Unknown;
    }
    let document = Html::parse_document(html);
    let text = visible_text_of(&document);
    classify_document(html, &document, text.chars().count(), text_threshold)
}

pub(crate) fn classify_document(
    raw: &str,
    document: &Html,
    text_len: usize,
    text_threshold: usize,
) -> SiteType {
    if !has_html_structure(raw) {
        return SiteType::Unknown;
    }

    if has_empty_mount_point(document) || text_len < text_threshold {
        return SiteType::Dynamic;
    }

    if references_framework(document) && text_len < text_threshold.saturating_mul(2) {
        return SiteType::Dynamic;
    }

    SiteType::Static
}

fn has_html_structure(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    ["<html", "<body", "<div", "<p", "<main"]
        .iter()
        .any(|tag| lower.contains(tag))
}

fn has_empty_mount_point(document: &Html) -> bool {
    document
        .select(&MOUNT_POINT_SELECTOR)
        .any(|element| element.text().all(|t| t.trim().is_empty()))
}

fn references_framework(document: &Html) -> bool {
    document.select(&SCRIPT_SELECTOR).any(|script| {
        let src = script.value().attr("src").unwrap_or("").to_ascii_lowercase();
        let inline = script.text().collect::<String>().to_ascii_lowercase();
        FRAMEWORK_MARKERS
            .iter()
            .any(|marker| src.contains(marker) || inline.contains(marker))
    })
}

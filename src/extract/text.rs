//! Visible and cleaned text extraction

use scraper::Html;

/// Elements whose text is never rendered
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements stripped from cleaned text: invisible ones plus page chrome
const CHROME_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "footer", "header", "aside", "iframe",
];

/// Returns all rendered text of a document, single-spaced
///
/// Page chrome (navigation, footer) is kept: contact details often live in
/// the footer, so this is the text emails and phones are mined from.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    visible_text_of(&document)
}

/// Converts HTML into clean, single-spaced plain text of at most `max_chars` characters
///
/// Strips script/style/nav/footer/header/aside/iframe elements, then
/// collapses whitespace.
///
/// # Example
///
/// ```
/// use contact_miner::extract::clean_text;
///
/// let html = "<html><body><nav>Menu</nav><p>Hello\n\n   world</p><footer>(c)</footer></body></html>";
/// assert_eq!(clean_text(html, 100), "Hello world");
/// ```
pub fn clean_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    clean_text_of(&document, max_chars)
}

pub(crate) fn visible_text_of(document: &Html) -> String {
    collect_text(document, INVISIBLE_ELEMENTS)
}

pub(crate) fn clean_text_of(document: &Html, max_chars: usize) -> String {
    truncate_chars(collect_text(document, CHROME_ELEMENTS), max_chars)
}

/// Concatenates text nodes that have no ancestor in `skipped`
fn collect_text(document: &Html, skipped: &[&str]) -> String {
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |element| skipped.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        raw.push_str(text);
        raw.push(' ');
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts a string to at most `max_chars` characters on a char boundary
pub(crate) fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((byte_index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_index);
        let trimmed_len = text.trim_end().len();
        text.truncate(trimmed_len);
    }
    text
}

//! North-American phone number extraction

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// `(555) 201-3344`, `555-201-3344`, `555.201.3344`, `+1 555 201 3344`
///
/// A separator between the exchange and the line number is required so bare
/// ten-digit identifiers (order numbers, timestamps) do not match.
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?1[\s.-]?)?(?:\((\d{3})\)\s?|(\d{3})[\s.-])(\d{3})[\s.-](\d{4})")
        .expect("valid phone pattern")
});

/// Extracts phone numbers from plain text, normalized to `NXX-NXX-XXXX`
///
/// Matches glued to other digits are skipped, as are numbers whose area
/// code or exchange starts with 0 or 1 (not dialable in the NANP).
///
/// # Example
///
/// ```
/// use contact_miner::extract::extract_phones;
///
/// let phones = extract_phones("Call (612) 555-0199 or +1 651.555.0123 today");
/// let phones: Vec<_> = phones.into_iter().collect();
/// assert_eq!(phones, vec!["612-555-0199", "651-555-0123"]);
/// ```
pub fn extract_phones(text: &str) -> BTreeSet<String> {
    let bytes = text.as_bytes();
    let mut phones = BTreeSet::new();

    for captures in PHONE_PATTERN.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };

        let glued_before = whole.start() > 0 && bytes[whole.start() - 1].is_ascii_digit();
        let glued_after = bytes.get(whole.end()).map_or(false, |b| b.is_ascii_digit());
        if glued_before || glued_after {
            continue;
        }

        let area = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str());
        let (Some(area), Some(exchange), Some(line)) = (
            area,
            captures.get(3).map(|m| m.as_str()),
            captures.get(4).map(|m| m.as_str()),
        ) else {
            continue;
        };

        if !is_dialable(area) || !is_dialable(exchange) {
            continue;
        }

        phones.insert(format!("{}-{}-{}", area, exchange, line));
    }

    phones
}

fn is_dialable(code: &str) -> bool {
    code.as_bytes().first().map_or(false, |b| (b'2'..=b'9').contains(b))
}

//! Keyword priorities for candidate contact pages

/// Path keywords and the priority they give a page
///
/// Keywords are matched against whole `-`/`_`/`.` separated tokens of a path
/// segment, so `contact` matches `/contact-information` but not `/contacts2go`.
const KEYWORD_PRIORITIES: &[(&str, u32)] = &[
    // Direct contact pages
    ("contact", 100),
    ("contact-us", 100),
    ("contactus", 100),
    ("kontakt", 100),
    ("contacto", 100),
    ("contato", 100),
    ("contatti", 100),
    ("contactez-nous", 100),
    ("get-in-touch", 100),
    ("reach-us", 100),
    ("email-us", 100),
    // Company pages, often carrying an address block
    ("about", 80),
    ("about-us", 80),
    ("aboutus", 80),
    ("info", 80),
    ("who-we-are", 80),
    ("our-story", 80),
    ("company", 80),
    ("impressum", 80),
    // People and support
    ("team", 60),
    ("our-team", 60),
    ("staff", 60),
    ("people", 60),
    ("leadership", 60),
    ("support", 60),
    ("help", 60),
    ("customer-service", 60),
    // Conversion pages
    ("quote", 40),
    ("get-quote", 40),
    ("request-quote", 40),
    ("estimate", 40),
    ("location", 40),
    ("locations", 40),
    ("schedule", 40),
    ("appointment", 40),
    ("booking", 40),
    ("hours", 40),
    ("directions", 40),
    ("office", 40),
    ("offices", 40),
    // Generic business pages
    ("services", 20),
    ("service", 20),
    ("business", 20),
    ("partners", 20),
    ("careers", 20),
    ("faq", 20),
    ("press", 20),
];

/// Leading path segments of CMS-managed static pages (Shopify `/pages/`,
/// `/policies/`) that usually hold the real contact page
const PAGE_PREFIXES: &[&str] = &["pages", "policies"];

/// Bonus for keyword matches under a [`PAGE_PREFIXES`] segment
pub const PAGE_PREFIX_BONUS: u32 = 50;

/// Path segments whose pages are never candidates
const EXCLUDED_SEGMENTS: &[&str] = &[
    "products",
    "product",
    "collections",
    "cart",
    "checkout",
    "account",
    "wp-admin",
    "wp-content",
    "wp-json",
];

/// File extensions of non-page resources
const NON_PAGE_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "css", "js", "json", "xml", "gz",
    "zip", "doc", "docx", "xls", "xlsx", "mp3", "mp4", "mov", "avi",
];

/// Page extensions stripped before keyword matching
const PAGE_EXTENSIONS: &[&str] = &["html", "htm", "php", "asp", "aspx", "jsp"];

/// Paths tried when sitemaps yield too few candidates, in order
pub const GUESSED_PATHS: &[&str] = &[
    "/contact",
    "/contact-us",
    "/about",
    "/about-us",
    "/pages/contact",
    "/team",
    "/get-quote",
    "/locations",
    "/support",
];

/// Score of a path and the keywords that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathScore {
    pub score: u32,
    pub keywords: Vec<String>,
}

/// Returns true if a path must never become a candidate
///
/// Excluded are store sections (`/products/...`, `/collections/...`, cart,
/// checkout, account), CMS internals, and non-page resources such as PDFs
/// and images.
pub fn is_excluded_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    let segments: Vec<&str> = lower.split('/').filter(|s| !s.is_empty()).collect();

    if segments.iter().any(|s| EXCLUDED_SEGMENTS.contains(s)) {
        return true;
    }

    match segments.last().and_then(|last| last.rsplit_once('.')) {
        Some((_, ext)) => NON_PAGE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Scores a URL path against the keyword table
///
/// The score is the highest keyword priority found in any path segment, plus
/// [`PAGE_PREFIX_BONUS`] when the first segment is a CMS page prefix. A path
/// without any keyword scores None.
///
/// # Example
///
/// ```
/// use contact_miner::discovery::score_path;
///
/// assert_eq!(score_path("/about-us").unwrap().score, 80);
/// assert_eq!(score_path("/policies/contact-information").unwrap().score, 150);
/// assert!(score_path("/blog/post-1").is_none());
/// ```
pub fn score_path(path: &str) -> Option<PathScore> {
    let lower = path.to_ascii_lowercase();
    let segments: Vec<&str> = lower.split('/').filter(|s| !s.is_empty()).collect();

    let mut best: Option<(u32, &str)> = None;
    for segment in &segments {
        let segment = strip_page_extension(segment);
        let tokens: Vec<&str> = segment
            .split(|c| c == '-' || c == '_' || c == '.')
            .filter(|t| !t.is_empty())
            .collect();

        for (keyword, priority) in KEYWORD_PRIORITIES {
            if best.map_or(true, |(score, _)| *priority > score)
                && contains_keyword(&tokens, keyword)
            {
                best = Some((*priority, *keyword));
            }
        }
    }

    let (mut score, keyword) = best?;
    let mut keywords = vec![keyword.to_string()];

    if let Some(prefix) = segments.first().filter(|s| PAGE_PREFIXES.contains(*s)) {
        if segments.len() > 1 {
            score += PAGE_PREFIX_BONUS;
            keywords.push(prefix.to_string());
        }
    }

    Some(PathScore { score, keywords })
}

fn strip_page_extension(segment: &str) -> &str {
    match segment.rsplit_once('.') {
        Some((stem, ext)) if PAGE_EXTENSIONS.contains(&ext) => stem,
        _ => segment,
    }
}

/// Returns true if the keyword's tokens appear consecutively in `tokens`
fn contains_keyword(tokens: &[&str], keyword: &str) -> bool {
    let wanted: Vec<&str> = keyword.split('-').collect();
    tokens
        .windows(wanted.len())
        .any(|window| window == wanted.as_slice())
}

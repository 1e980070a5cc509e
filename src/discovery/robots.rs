//! robots.txt scanning for sitemap declarations
//!
//! Only `Sitemap:` directives are read. Allow/Disallow rules are not
//! enforced: the engine visits a handful of well-known pages per site.

/// Extracts the `Sitemap:` directive values of a robots.txt body
///
/// Directive names are case-insensitive, comments (`# ...`) are ignored
/// and values keep their order of appearance. Sitemap directives are not
/// tied to a user-agent group, so every one is returned.
///
/// # Example
///
/// ```
/// use contact_miner::discovery::sitemap_directives;
///
/// let robots = "User-agent: *\nDisallow: /cart\nSitemap: https://acme.test/sitemap.xml # main\n";
/// assert_eq!(sitemap_directives(robots), vec!["https://acme.test/sitemap.xml"]);
/// ```
pub fn sitemap_directives(content: &str) -> Vec<String> {
    let mut sitemaps = Vec::new();

    for line in content.lines() {
        // Strip comments, then whitespace
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            if (key == "sitemap" || key == "site-map") && !value.is_empty() {
                if !sitemaps.iter().any(|s| s == value) {
                    sitemaps.push(value.to_string());
                }
            }
        }
    }

    sitemaps
}

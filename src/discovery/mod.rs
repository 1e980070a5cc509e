//! Page discovery: which pages of a site are worth a deep search
//!
//! Candidates come from two sources, in this order:
//! 1. Sitemaps: declared in robots.txt or found at well-known paths, one
//!    level of sitemap index expanded, entries ranked by path keywords
//! 2. Guessed paths (`/contact`, `/about`, ...) appended until `max_pages`
//!
//! Discovery never fails: unreachable robots.txt or broken sitemaps simply
//! fall through to the guessed paths.

mod robots;
mod scoring;
mod sitemap;

pub use robots::sitemap_directives;
pub use scoring::{is_excluded_path, score_path, PathScore, GUESSED_PATHS, PAGE_PREFIX_BONUS};
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapError};

use crate::config::DiscoveryConfig;
use crate::fetch::Fetcher;
use crate::model::DiscoveryStrategy;
use crate::url::{resolve_on_site, target_id};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Well-known sitemap locations tried when robots.txt declares none
pub const WELL_KNOWN_SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/wp-sitemap.xml",
];

/// A page selected for deep search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePage {
    pub url: Url,

    /// Keyword priority, page prefix bonus included
    pub score: u32,

    /// Keywords that produced the score
    pub keywords: Vec<String>,
}

/// Ordered candidates of one site and how they were found
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Best first; never contains the homepage, never more than `max_pages`
    pub candidates: Vec<CandidatePage>,

    pub strategy: DiscoveryStrategy,

    /// Sitemap documents (indexes included) that parsed successfully
    pub sitemaps_read: usize,
}

/// Page URLs collected from a site's sitemaps
#[derive(Debug, Default)]
struct SitemapHarvest {
    documents: usize,
    page_urls: Vec<String>,
}

/// Discovers candidate contact pages of a site
///
/// # Arguments
///
/// * `fetcher` - Fetcher used for robots.txt and sitemap documents
/// * `site_root` - Root URL of the site (after homepage redirects)
/// * `config` - Discovery limits
///
/// # Returns
///
/// Up to `max_pages` candidates. Sitemap candidates come first, ordered by
/// score (higher first), then shorter path, then URL. Guessed paths fill
/// the remaining slots in their fixed order.
pub async fn discover(
    fetcher: &dyn Fetcher,
    site_root: &Url,
    config: &DiscoveryConfig,
) -> Discovery {
    let harvest = if config.use_sitemaps {
        harvest_sitemaps(fetcher, site_root, config.max_child_sitemaps).await
    } else {
        SitemapHarvest::default()
    };

    let mut seen = HashSet::new();
    let mut candidates = rank_sitemap_urls(&harvest.page_urls, site_root, &mut seen);
    candidates.truncate(config.max_pages);
    let from_sitemap = candidates.len();

    for path in GUESSED_PATHS {
        if candidates.len() >= config.max_pages {
            break;
        }
        let Some(url) = resolve_on_site(path, site_root) else {
            continue;
        };
        if !seen.insert(page_key(&url)) {
            continue;
        }
        let scored = score_path(path).unwrap_or(PathScore {
            score: 0,
            keywords: Vec::new(),
        });
        candidates.push(CandidatePage {
            url,
            score: scored.score,
            keywords: scored.keywords,
        });
    }

    let strategy = if harvest.documents == 0 {
        DiscoveryStrategy::Pattern
    } else if from_sitemap >= config.max_pages {
        DiscoveryStrategy::Sitemap
    } else {
        DiscoveryStrategy::SitemapPlusPattern
    };

    debug!(
        "Discovery for {}: {} candidates ({} from {} sitemaps), strategy {}",
        site_root,
        candidates.len(),
        from_sitemap,
        harvest.documents,
        strategy.as_str()
    );

    Discovery {
        candidates,
        strategy,
        sitemaps_read: harvest.documents,
    }
}

/// Scores, filters and orders sitemap entries
///
/// Entries on another site, the homepage, excluded sections and entries
/// without any keyword are dropped. Entries on the same host under another
/// scheme are moved onto `site_root`.
fn rank_sitemap_urls(
    page_urls: &[String],
    site_root: &Url,
    seen: &mut HashSet<String>,
) -> Vec<CandidatePage> {
    let root_id = target_id(site_root);
    let mut candidates = Vec::new();

    for raw in page_urls {
        let Some(listed) = resolve_on_site(raw, site_root) else {
            continue;
        };
        if root_id.is_none() || target_id(&listed) != root_id {
            continue;
        }

        let mut url = site_root.clone();
        url.set_path(listed.path());
        url.set_query(listed.query());

        let path = url.path();
        if path.trim_matches('/').is_empty() || is_excluded_path(path) {
            continue;
        }
        let Some(scored) = score_path(path) else {
            continue;
        };
        if !seen.insert(page_key(&url)) {
            continue;
        }

        candidates.push(CandidatePage {
            url,
            score: scored.score,
            keywords: scored.keywords,
        });
    }

    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.url.path().len().cmp(&b.url.path().len()))
            .then_with(|| a.url.as_str().cmp(b.url.as_str()))
    });
    candidates
}

/// Identity of a page for de-duplication: `/Contact/` and `/contact` collide
fn page_key(url: &Url) -> String {
    let mut key = url.path().trim_end_matches('/').to_ascii_lowercase();
    if let Some(query) = url.query() {
        key.push('?');
        key.push_str(query);
    }
    key
}

/// Reads robots.txt-declared or well-known sitemaps, expanding one index level
async fn harvest_sitemaps(
    fetcher: &dyn Fetcher,
    site_root: &Url,
    max_child_sitemaps: usize,
) -> SitemapHarvest {
    let mut harvest = SitemapHarvest::default();

    let declared = declared_sitemaps(fetcher, site_root).await;
    let mut roots = Vec::new();
    if declared.is_empty() {
        for path in WELL_KNOWN_SITEMAP_PATHS {
            let Some(url) = resolve_on_site(path, site_root) else {
                continue;
            };
            if let Some(document) = fetch_sitemap(fetcher, &url).await {
                roots.push(document);
                break;
            }
        }
    } else {
        for url in declared.iter().take(max_child_sitemaps.max(1)) {
            if let Some(document) = fetch_sitemap(fetcher, url).await {
                roots.push(document);
            }
        }
    }

    let mut children = Vec::new();
    for document in roots {
        harvest.documents += 1;
        match document {
            SitemapDocument::UrlSet(pages) => harvest.page_urls.extend(pages),
            SitemapDocument::Index(locations) => children.extend(
                locations
                    .iter()
                    .filter_map(|loc| resolve_on_site(loc, site_root)),
            ),
        }
    }

    if children.len() > max_child_sitemaps {
        debug!(
            "Sitemap index of {} lists {} children, reading {}",
            site_root,
            children.len(),
            max_child_sitemaps
        );
        children.truncate(max_child_sitemaps);
    }

    let fetches: Vec<_> = children
        .iter()
        .map(|url| fetch_sitemap(fetcher, url))
        .collect();
    for document in futures::future::join_all(fetches).await.into_iter().flatten() {
        harvest.documents += 1;
        match document {
            SitemapDocument::UrlSet(pages) => harvest.page_urls.extend(pages),
            SitemapDocument::Index(_) => {
                debug!("Ignoring nested sitemap index under {}", site_root);
            }
        }
    }

    harvest
}

/// Sitemap URLs declared by the site's robots.txt
async fn declared_sitemaps(fetcher: &dyn Fetcher, site_root: &Url) -> Vec<Url> {
    let Some(robots_url) = resolve_on_site("/robots.txt", site_root) else {
        return Vec::new();
    };

    let result = fetcher.fetch_document(robots_url.as_str()).await;
    match result.body() {
        Some(body) => sitemap_directives(body)
            .iter()
            .filter_map(|value| resolve_on_site(value, site_root))
            .collect(),
        None => {
            debug!("No robots.txt for {} ({})", site_root, result.outcome.label());
            Vec::new()
        }
    }
}

/// Fetches and parses one sitemap; any failure means "no sitemap here"
async fn fetch_sitemap(fetcher: &dyn Fetcher, url: &Url) -> Option<SitemapDocument> {
    if url.path().ends_with(".gz") {
        debug!("Skipping compressed sitemap {}", url);
        return None;
    }

    let result = fetcher.fetch_document(url.as_str()).await;
    let body = result.body()?;

    match parse_sitemap(body) {
        Ok(document) => Some(document),
        Err(e) => {
            debug!("Unusable sitemap at {}: {}", url, e);
            None
        }
    }
}

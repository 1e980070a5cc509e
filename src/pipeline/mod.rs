//! Per-target pipeline: homepage first, then an optional deep search
//!
//! # State machine
//!
//! | Step | Outcome |
//! |------|---------|
//! | Homepage fetch fails | `failed`, reason taken from the fetch |
//! | Emails disabled | `success` without emails (content-only mode), dynamic shells included |
//! | Homepage yields emails | `success`, source `homepage` |
//! | A candidate page yields emails | `success`, source `deep_search` |
//! | Nothing found | `failed`, `no_email_found_static` or `no_email_found_dynamic` |
//!
//! A homepage served as a client-side rendered shell is still mined, but
//! never deep searched: its other pages are shells too.

use crate::config::{Config, DiscoveryConfig, RunnerKind, ScrapeConfig, ScrapeMode};
use crate::discovery::{discover, CandidatePage, Discovery};
use crate::extract::{extract_page, rank_emails, truncate_chars, ExtractOptions, ExtractionResult};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::model::{EmailSource, FailureReason, SiteType, Target, TargetResult};
use crate::url::{email_domain, site_root, target_id};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How candidate pages of one target are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeepSearchMode {
    /// One page at a time, best candidate first
    Sequential,

    /// Up to `max_in_flight` pages at once; the first page with emails wins
    /// and the remaining requests are left to finish on their own
    Concurrent { max_in_flight: usize },
}

/// A page fetched during deep search
#[derive(Debug)]
struct CandidateVisit {
    candidate: CandidatePage,
    page: Option<ExtractionResult>,
}

/// What the deep search produced
#[derive(Debug, Default)]
struct DeepSearchOutcome {
    winner: Option<CandidateVisit>,
    pages_fetched: u32,
    texts: Vec<String>,
}

/// Runs the homepage/deep-search decision logic for single targets
///
/// The pipeline is shared by every worker of a run; it holds no per-target
/// state.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    scrape: ScrapeConfig,
    discovery: DiscoveryConfig,
    extract: ExtractOptions,
    deep_search: DeepSearchMode,
}

impl Pipeline {
    /// Creates a pipeline for a run
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher shared with discovery
    /// * `config` - Run configuration; the runner kind selects the deep-search mode
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        let deep_search = match config.runner.kind {
            RunnerKind::Pool => DeepSearchMode::Sequential,
            RunnerKind::Concurrent => DeepSearchMode::Concurrent {
                max_in_flight: config.runner.per_host_concurrency.max(1),
            },
        };

        Self {
            fetcher,
            scrape: config.scrape.clone(),
            discovery: config.discovery.clone(),
            extract: ExtractOptions::from(config),
            deep_search,
        }
    }

    /// Processes one target to its terminal result
    ///
    /// Never fails: every network or content problem is expressed in the
    /// returned [`TargetResult`].
    pub async fn process(&self, target: Target) -> TargetResult {
        let started = Instant::now();
        let mut result = self.run(target).await;
        result.elapsed = started.elapsed();
        result
    }

    async fn run(&self, target: Target) -> TargetResult {
        let home = self.fetcher.fetch_page(target.url.as_str()).await;
        let homepage_attempts = home.attempts;

        let reason = home.failure_reason();

        let (final_url, body, served_dynamic) = match home.outcome {
            FetchOutcome::Success { final_url, body } => (final_url, body, false),
            FetchOutcome::Dynamic { final_url, body } => (final_url, body, true),
            other => {
                let reason = reason.unwrap_or(FailureReason::ConnectionError);
                debug!(
                    "Homepage of {} failed: {} after {} attempts",
                    target.label(),
                    other.label(),
                    homepage_attempts
                );
                let mut failed = TargetResult::failed(target, reason, SiteType::Unknown);
                failed.homepage_attempts = homepage_attempts;
                return failed;
            }
        };

        let homepage = extract_page(&body, &self.extract);
        drop(body);
        let site_type = if served_dynamic {
            SiteType::Dynamic
        } else {
            homepage.site_type
        };

        // Discovery starts from the final root only while it is still the same site
        let root = if target_id(&final_url) == Some(target.id.clone()) {
            site_root(&final_url)
        } else {
            site_root(&target.url)
        };
        let site_domain = email_domain(&root);

        let mut phones = homepage.phones.clone();
        let mut text = homepage.text.clone();
        let mut pages_fetched = 1;

        let mut result = if !self.scrape.extract_emails {
            TargetResult::success(target, Vec::new(), EmailSource::None, site_type, false)
        } else if homepage.has_emails() {
            let emails = rank_emails(homepage.emails, site_domain.as_deref());
            TargetResult::success(target, emails, EmailSource::Homepage, site_type, true)
        } else if self.scrape.mode == ScrapeMode::DeepSearch && !served_dynamic {
            let discovery = discover(self.fetcher.as_ref(), &root, &self.discovery).await;
            let outcome = self.deep_search(&target, &discovery).await;
            pages_fetched += outcome.pages_fetched;

            if self.scrape.preserve_content {
                for page_text in outcome.texts.iter().filter(|t| !t.is_empty()) {
                    if !text.is_empty() {
                        text.push_str("\n\n");
                    }
                    text.push_str(page_text);
                }
                text = truncate_chars(text, self.scrape.max_text_chars);
            }

            let mut result = match outcome.winner {
                Some(CandidateVisit {
                    candidate,
                    page: Some(page),
                }) => {
                    debug!(
                        "Deep search hit for {} at {} (score {})",
                        target.label(),
                        candidate.url,
                        candidate.score
                    );
                    phones.extend(page.phones);
                    let emails = rank_emails(page.emails, site_domain.as_deref());
                    TargetResult::success(target, emails, EmailSource::DeepSearch, site_type, true)
                }
                _ => TargetResult::failed(target, no_email_reason(site_type), site_type),
            };
            result.discovery = Some(discovery.strategy);
            result
        } else {
            TargetResult::failed(target, no_email_reason(site_type), site_type)
        };

        result.phones = phones.into_iter().collect();
        if self.scrape.include_text || self.scrape.preserve_content {
            result.text = Some(std::mem::take(&mut text));
        }
        result.pages_fetched = pages_fetched;
        result.homepage_attempts = homepage_attempts;
        result
    }

    async fn deep_search(&self, target: &Target, discovery: &Discovery) -> DeepSearchOutcome {
        if discovery.candidates.is_empty() {
            return DeepSearchOutcome::default();
        }

        match self.deep_search {
            DeepSearchMode::Sequential => self.search_sequential(&discovery.candidates).await,
            DeepSearchMode::Concurrent { max_in_flight } => {
                self.search_concurrent(target, &discovery.candidates, max_in_flight)
                    .await
            }
        }
    }

    /// Visits candidates best first, stopping at the first page with emails
    async fn search_sequential(&self, candidates: &[CandidatePage]) -> DeepSearchOutcome {
        let mut outcome = DeepSearchOutcome::default();

        for candidate in candidates {
            let visit = visit_candidate(
                Arc::clone(&self.fetcher),
                candidate.clone(),
                self.extract,
            )
            .await;
            if let Some(page) = &visit.page {
                outcome.pages_fetched += 1;
                outcome.texts.push(page.text.clone());
                if page.has_emails() {
                    outcome.winner = Some(visit);
                    break;
                }
            }
        }

        outcome
    }

    /// Visits candidates concurrently; the first page with emails wins
    ///
    /// Each visit runs as its own task. Once a winner is known the remaining
    /// handles are dropped, which detaches their tasks: requests in flight
    /// finish or time out on their own and their results are ignored.
    async fn search_concurrent(
        &self,
        target: &Target,
        candidates: &[CandidatePage],
        max_in_flight: usize,
    ) -> DeepSearchOutcome {
        let mut outcome = DeepSearchOutcome::default();
        let mut pending = candidates.iter().cloned();
        let mut in_flight: FuturesUnordered<JoinHandle<CandidateVisit>> = FuturesUnordered::new();

        for candidate in pending.by_ref().take(max_in_flight.max(1)) {
            in_flight.push(self.spawn_visit(candidate));
        }

        while let Some(joined) = in_flight.next().await {
            let visit = match joined {
                Ok(visit) => visit,
                Err(e) => {
                    warn!("Deep search task for {} failed: {}", target.label(), e);
                    continue;
                }
            };

            if let Some(page) = &visit.page {
                outcome.pages_fetched += 1;
                outcome.texts.push(page.text.clone());
                if page.has_emails() {
                    outcome.winner = Some(visit);
                    break;
                }
            }

            if let Some(candidate) = pending.next() {
                in_flight.push(self.spawn_visit(candidate));
            }
        }

        outcome
    }

    fn spawn_visit(&self, candidate: CandidatePage) -> JoinHandle<CandidateVisit> {
        tokio::spawn(visit_candidate(
            Arc::clone(&self.fetcher),
            candidate,
            self.extract,
        ))
    }
}

/// Fetches and extracts one candidate page
///
/// Candidates that fail to fetch, or are served as dynamic shells, yield no
/// extraction.
async fn visit_candidate(
    fetcher: Arc<dyn Fetcher>,
    candidate: CandidatePage,
    options: ExtractOptions,
) -> CandidateVisit {
    let fetched = fetcher.fetch_page(candidate.url.as_str()).await;
    let page = fetched.body().map(|body| extract_page(body, &options));
    if page.is_none() {
        debug!(
            "Candidate {} skipped: {}",
            candidate.url,
            fetched.outcome.label()
        );
    }
    CandidateVisit { candidate, page }
}

/// Failure reason for a target whose pages yielded no email
fn no_email_reason(site_type: SiteType) -> FailureReason {
    match site_type {
        SiteType::Dynamic => FailureReason::NoEmailFoundDynamic,
        SiteType::Static | SiteType::Unknown => FailureReason::NoEmailFoundStatic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchResult;
    use crate::model::{DiscoveryStrategy, TargetStatus};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use url::Url;

    /// Serves canned outcomes; unknown URLs answer 404
    #[derive(Default)]
    struct StubFetcher {
        pages: HashMap<String, FetchOutcome>,
        requested: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                FetchOutcome::Success {
                    final_url: Url::parse(url).unwrap(),
                    body: html.to_string(),
                },
            );
            self
        }

        fn outcome(mut self, url: &str, outcome: FetchOutcome) -> Self {
            self.pages.insert(url.to_string(), outcome);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().clone()
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch_page(&self, url: &str) -> FetchResult {
            self.fetch_document(url).await
        }

        async fn fetch_document(&self, url: &str) -> FetchResult {
            self.requested.lock().push(url.to_string());
            FetchResult {
                url: url.to_string(),
                outcome: self
                    .pages
                    .get(url)
                    .cloned()
                    .unwrap_or(FetchOutcome::HttpError(404)),
                attempts: 1,
            }
        }

        fn max_attempts(&self) -> u32 {
            1
        }
    }

    fn filler() -> String {
        "Family owned plumbing and heating contractor serving the metro area since 1987. "
            .repeat(5)
    }

    fn target() -> Target {
        Target::new(Url::parse("https://acme.test/").unwrap(), Some("Acme".into())).unwrap()
    }

    fn pipeline(fetcher: StubFetcher, config: &Config) -> (Pipeline, Arc<StubFetcher>) {
        let fetcher = Arc::new(fetcher);
        let shared: Arc<dyn Fetcher> = fetcher.clone();
        (Pipeline::new(shared, config), fetcher)
    }

    #[tokio::test]
    async fn test_homepage_email_wins() {
        let home = format!(
            r#"<html><body><p>{}</p><a href="mailto:info@Acme.COM">Email us</a></body></html>"#,
            filler()
        );
        let (pipeline, fetcher) = pipeline(
            StubFetcher::default().page("https://acme.test/", &home),
            &Config::default(),
        );

        let result = pipeline.process(target()).await;

        assert_eq!(result.status, TargetStatus::Success);
        assert_eq!(result.email_source, EmailSource::Homepage);
        assert_eq!(result.emails, vec!["info@acme.com"]);
        assert_eq!(result.discovery, None);
        assert_eq!(fetcher.requested(), vec!["https://acme.test/"]);
    }

    #[tokio::test]
    async fn test_homepage_http_error() {
        let (pipeline, _) = pipeline(
            StubFetcher::default().outcome("https://acme.test/", FetchOutcome::HttpError(404)),
            &Config::default(),
        );

        let result = pipeline.process(target()).await;

        assert_eq!(result.status, TargetStatus::Failed);
        assert_eq!(result.failure_reason, Some(FailureReason::HttpError(404)));
        assert_eq!(result.homepage_attempts, 1);
        assert_eq!(result.pages_fetched, 0);
    }

    #[tokio::test]
    async fn test_deep_search_on_guessed_contact_page() {
        for kind in [RunnerKind::Pool, RunnerKind::Concurrent] {
            let mut config = Config::default();
            config.runner.kind = kind;
            let home = format!("<html><body><p>{}</p></body></html>", filler());
            let contact = "<html><body><p>Write to sales@acme.test for a quote.</p></body></html>";
            let (pipeline, _) = pipeline(
                StubFetcher::default()
                    .page("https://acme.test/", &home)
                    .page("https://acme.test/contact", contact),
                &config,
            );

            let result = pipeline.process(target()).await;

            assert_eq!(result.status, TargetStatus::Success, "{:?}", kind);
            assert_eq!(result.email_source, EmailSource::DeepSearch);
            assert_eq!(result.emails, vec!["sales@acme.test"]);
            assert_eq!(result.discovery, Some(DiscoveryStrategy::Pattern));
            assert!(result.pages_fetched >= 2);
        }
    }

    #[tokio::test]
    async fn test_sequential_search_stops_at_first_hit() {
        let mut config = Config::default();
        config.runner.kind = RunnerKind::Pool;
        let home = format!("<html><body><p>{}</p></body></html>", filler());
        let (pipeline, fetcher) = pipeline(
            StubFetcher::default()
                .page("https://acme.test/", &home)
                .page("https://acme.test/contact", "<p>hello@acme.test</p>")
                .page("https://acme.test/about", "<p>other@acme.test</p>"),
            &config,
        );

        pipeline.process(target()).await;

        let requested = fetcher.requested();
        assert!(requested.contains(&"https://acme.test/contact".to_string()));
        assert!(!requested.contains(&"https://acme.test/about".to_string()));
    }

    #[tokio::test]
    async fn test_no_email_reason_follows_site_type() {
        let mut config = Config::default();
        config.discovery.use_sitemaps = false;
        let home = format!("<html><body><p>{}</p></body></html>", filler());
        let (pipeline, _) = pipeline(
            StubFetcher::default().page("https://acme.test/", &home),
            &config,
        );
        let result = pipeline.process(target()).await;
        assert_eq!(
            result.failure_reason,
            Some(FailureReason::NoEmailFoundStatic)
        );

        let shell = r#"<html><head><script src="/static/js/main.js"></script></head><body><div id="root"></div></body></html>"#;
        let (pipeline, _) = self::pipeline(
            StubFetcher::default().page("https://acme.test/", shell),
            &config,
        );
        let result = pipeline.process(target()).await;
        assert_eq!(
            result.failure_reason,
            Some(FailureReason::NoEmailFoundDynamic)
        );
        assert_eq!(result.site_type, SiteType::Dynamic);
    }

    #[tokio::test]
    async fn test_homepage_only_skips_discovery() {
        let mut config = Config::default();
        config.scrape.mode = ScrapeMode::HomepageOnly;
        let home = format!("<html><body><p>{}</p></body></html>", filler());
        let (pipeline, fetcher) = pipeline(
            StubFetcher::default().page("https://acme.test/", &home),
            &config,
        );

        let result = pipeline.process(target()).await;

        assert_eq!(result.status, TargetStatus::Failed);
        assert_eq!(fetcher.requested().len(), 1);
    }

    #[tokio::test]
    async fn test_content_only_mode() {
        let mut config = Config::default();
        config.scrape.extract_emails = false;
        config.scrape.include_text = true;
        let home = format!("<html><body><p>{}</p></body></html>", filler());
        let (pipeline, _) = pipeline(
            StubFetcher::default().page("https://acme.test/", &home),
            &config,
        );

        let result = pipeline.process(target()).await;

        assert_eq!(result.status, TargetStatus::Success);
        assert!(result.emails.is_empty());
        assert!(!result.emails_requested);
        assert!(result.text.unwrap().starts_with("Family owned"));
    }

    #[tokio::test]
    async fn test_content_only_mode_keeps_dynamic_shells() {
        let mut config = Config::default();
        config.scrape.extract_emails = false;
        let shell = r#"<html><body><div id="root"></div></body></html>"#;
        let (pipeline, fetcher) = pipeline(
            StubFetcher::default().outcome(
                "https://acme.test/",
                FetchOutcome::Dynamic {
                    final_url: Url::parse("https://acme.test/").unwrap(),
                    body: shell.to_string(),
                },
            ),
            &config,
        );

        let result = pipeline.process(target()).await;

        assert_eq!(result.status, TargetStatus::Success);
        assert_eq!(result.failure_reason, None);
        assert_eq!(result.site_type, SiteType::Dynamic);
        assert_eq!(result.email_source, EmailSource::None);
        assert_eq!(fetcher.requested(), vec!["https://acme.test/"]);
    }

    #[tokio::test]
    async fn test_preserve_content_concatenates_pages() {
        let mut config = Config::default();
        config.runner.kind = RunnerKind::Pool;
        config.scrape.preserve_content = true;
        config.discovery.use_sitemaps = false;
        let home = format!("<html><body><p>{}</p></body></html>", filler());
        let (pipeline, _) = pipeline(
            StubFetcher::default()
                .page("https://acme.test/", &home)
                .page(
                    "https://acme.test/contact",
                    "<p>Visit our showroom on Main Street.</p>",
                ),
            &config,
        );

        let result = pipeline.process(target()).await;

        let text = result.text.unwrap();
        assert!(text.starts_with("Family owned"));
        assert!(text.contains("Visit our showroom on Main Street."));
    }

    #[tokio::test]
    async fn test_phones_from_homepage_and_winner() {
        let mut config = Config::default();
        config.runner.kind = RunnerKind::Pool;
        let home = format!(
            "<html><body><p>{} Call (612) 555-0199.</p></body></html>",
            filler()
        );
        let (pipeline, _) = pipeline(
            StubFetcher::default().page("https://acme.test/", &home).page(
                "https://acme.test/contact",
                "<p>sales@acme.test or 651.555.0142</p>",
            ),
            &config,
        );

        let result = pipeline.process(target()).await;

        assert_eq!(result.phones, vec!["612-555-0199", "651-555-0142"]);
    }
}

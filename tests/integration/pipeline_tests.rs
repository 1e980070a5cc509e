//! Per-target pipeline against mock sites

use crate::common::{html, mount_page, page, target_for, test_config};
use contact_miner::config::{RunnerKind, ScrapeMode};
use contact_miner::fetch::{build_fetcher, RetryingFetcher};
use contact_miner::model::{DiscoveryStrategy, EmailSource, SiteType};
use contact_miner::pipeline::Pipeline;
use contact_miner::{FailureReason, TargetStatus};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_homepage_mailto_is_normalized() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        page(r#"<a href="mailto:info@Acme.COM">Email us</a>"#),
    )
    .await;

    let config = test_config(RunnerKind::Pool);
    let pipeline = Pipeline::new(build_fetcher(&config).unwrap(), &config);

    let result = pipeline.process(target_for(&server)).await;

    assert_eq!(result.status, TargetStatus::Success);
    assert_eq!(result.emails, vec!["info@acme.com"]);
    assert_eq!(result.email_source, EmailSource::Homepage);
    assert_eq!(result.site_type, SiteType::Static);
    assert_eq!(result.discovery, None);
    assert_eq!(result.pages_fetched, 1);
    assert_eq!(result.homepage_attempts, 1);
}

#[tokio::test]
async fn test_deep_search_finds_contact_page() {
    for kind in [RunnerKind::Pool, RunnerKind::Concurrent] {
        let server = MockServer::start().await;
        mount_page(&server, "/", page("<p>Call us today.</p>")).await;
        mount_page(
            &server,
            "/contact",
            page("<p>Reach our team at sales@acme.test</p>"),
        )
        .await;

        let config = test_config(kind);
        let pipeline = Pipeline::new(build_fetcher(&config).unwrap(), &config);

        let result = pipeline.process(target_for(&server)).await;

        assert_eq!(result.status, TargetStatus::Success, "runner {:?}", kind);
        assert_eq!(result.emails, vec!["sales@acme.test"]);
        assert_eq!(result.email_source, EmailSource::DeepSearch);
        assert_eq!(result.discovery, Some(DiscoveryStrategy::Pattern));
        assert!(result.pages_fetched >= 2);
    }
}

#[tokio::test]
async fn test_mis_scraped_homepage_is_discarded() {
    let server = MockServer::start().await;
    let directory: String = (0..25)
        .map(|i| format!("<li>member{}@acme.test</li>", i))
        .collect();
    mount_page(&server, "/", page(&format!("<ul>{}</ul>", directory))).await;

    let mut config = test_config(RunnerKind::Pool);
    config.scrape.mode = ScrapeMode::HomepageOnly;
    let pipeline = Pipeline::new(build_fetcher(&config).unwrap(), &config);

    let result = pipeline.process(target_for(&server)).await;

    assert_eq!(result.status, TargetStatus::Failed);
    assert_eq!(
        result.failure_reason,
        Some(FailureReason::NoEmailFoundStatic)
    );
    assert!(result.emails.is_empty());
}

#[tokio::test]
async fn test_http_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(RunnerKind::Pool);
    let pipeline = Pipeline::new(build_fetcher(&config).unwrap(), &config);

    let result = pipeline.process(target_for(&server)).await;

    assert_eq!(result.status, TargetStatus::Failed);
    assert_eq!(result.failure_reason, Some(FailureReason::HttpError(404)));
    assert_eq!(
        result.failure_reason.map(|r| r.code()),
        Some("http_error_404".to_string())
    );
    assert_eq!(result.homepage_attempts, 1);
    assert_eq!(result.pages_fetched, 0);
}

#[tokio::test]
async fn test_timeout_spends_the_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(page("")).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = test_config(RunnerKind::Pool);
    config.fetch.timeout_secs = 1;
    config.fetch.max_attempts = 2;
    let fetcher = Arc::new(RetryingFetcher::new(config.fetch.clone()).unwrap());
    let pipeline = Pipeline::new(fetcher, &config);

    let result = pipeline.process(target_for(&server)).await;

    assert_eq!(result.status, TargetStatus::Failed);
    assert_eq!(result.failure_reason, Some(FailureReason::Timeout));
    assert_eq!(result.homepage_attempts, 2);
}

#[tokio::test]
async fn test_content_only_mode_succeeds_without_emails() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("<p>No mailbox listed.</p>")).await;

    let mut config = test_config(RunnerKind::Concurrent);
    config.scrape.extract_emails = false;
    config.scrape.include_text = true;
    let pipeline = Pipeline::new(build_fetcher(&config).unwrap(), &config);

    let result = pipeline.process(target_for(&server)).await;

    assert_eq!(result.status, TargetStatus::Success);
    assert!(!result.emails_requested);
    assert!(result.emails.is_empty());
    assert!(result
        .text
        .as_deref()
        .is_some_and(|text| text.contains("Twin Cities")));
}

//! Shared fixtures for the integration tests

use contact_miner::config::{Config, OutputFormat, RunnerKind};
use contact_miner::normalize_target_url;
use contact_miner::Target;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration tuned for local mock servers: no jitter, short backoff
pub fn test_config(kind: RunnerKind) -> Config {
    let mut config = Config::default();
    config.runner.kind = kind;
    config.runner.workers = 4;
    config.fetch.timeout_secs = 5;
    config.fetch.max_attempts = 2;
    config.fetch.backoff_base_ms = 10;
    config.fetch.jitter_min_ms = 0;
    config.fetch.jitter_max_ms = 0;
    config.fetch.progressive_timeouts_secs = vec![5, 5];
    config
}

/// Configuration writing outputs into `dir`
pub fn run_config(kind: RunnerKind, dir: &Path) -> Config {
    let mut config = test_config(kind);
    config.output.directory = dir.to_string_lossy().to_string();
    config.output.formats = vec![OutputFormat::Csv, OutputFormat::Sqlite];
    config.checkpoint.interval = 1;
    config
}

/// Enough server-rendered text to classify a page as static
pub fn filler() -> String {
    "Acme Heating and Cooling has served the Twin Cities for over thirty years with honest, \
     reliable furnace repair and installation. "
        .repeat(3)
}

/// An HTML page with body text and extra markup
pub fn page(extra: &str) -> String {
    format!(
        "<html><head><title>Acme</title></head><body><main><p>{}</p>{}</main></body></html>",
        filler(),
        extra
    )
}

pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

pub fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/xml")
}

/// Mounts an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// The target rooted at a mock server
pub fn target_for(server: &MockServer) -> Target {
    let url = normalize_target_url(&server.uri()).expect("mock server URL");
    Target::new(url, Some("Acme".to_string())).expect("mock server target")
}

pub fn urlset(base: &str, paths: &[&str]) -> String {
    let entries: String = paths
        .iter()
        .map(|p| format!("<url><loc>{}{}</loc></url>", base, p))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

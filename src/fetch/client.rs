//! HTTP client construction and the single-attempt request logic

use crate::config::FetchConfig;
use crate::extract::visible_text;
use crate::fetch::FetchOutcome;
use rand::Rng;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// What the response is going to be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchKind {
    /// HTML page: content type and dynamic checks apply
    Page,
    /// robots.txt or sitemap: body accepted as-is
    Document,
}

/// Builds the HTTP client of the retrying fetcher
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use contact_miner::config::FetchConfig;
/// use contact_miner::fetch::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the shared client of the pooled fetcher
///
/// Keep-alive connections are reused per host (bounded by
/// `max_idle_per_host`) and DNS answers are cached by the resolver. No
/// client-wide timeout is set; each attempt carries its own.
pub fn build_pooled_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .trust_dns(true)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sleeps for a random duration within the configured jitter window
pub(crate) async fn jitter(config: &FetchConfig) {
    if config.jitter_max_ms == 0 {
        return;
    }
    let millis = rand::thread_rng().gen_range(config.jitter_min_ms..=config.jitter_max_ms);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

/// Issues one GET and classifies the response
///
/// # Classification
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | Non-2xx status | `HttpError(status)` |
/// | Page with non-textual Content-Type | `NotHtml` |
/// | Page with thin visible text (detection on) | `Dynamic` |
/// | Timeout (connect, headers or body) | `Timeout` |
/// | Connect/DNS/TLS/reset | `ConnectionError` |
pub(crate) async fn attempt(
    client: &Client,
    url: &Url,
    timeout: Duration,
    kind: FetchKind,
    config: &FetchConfig,
) -> FetchOutcome {
    let response = match client.get(url.clone()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchOutcome::HttpError(status.as_u16());
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if kind == FetchKind::Page && !is_textual(&content_type) {
        return FetchOutcome::NotHtml(content_type);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return classify_error(&e),
    };

    if kind == FetchKind::Page && config.detect_dynamic {
        let text_len = visible_text(&body).chars().count();
        if text_len < config.dynamic_text_threshold {
            tracing::debug!(
                "{} rendered only {} visible characters, classifying as dynamic",
                final_url,
                text_len
            );
            return FetchOutcome::Dynamic { final_url, body };
        }
    }

    FetchOutcome::Success { final_url, body }
}

/// Accepts HTML and other textual types; a missing header is not a rejection
fn is_textual(content_type: &str) -> bool {
    content_type.is_empty() || content_type.contains("html") || content_type.starts_with("text/")
}

fn classify_error(error: &reqwest::Error) -> FetchOutcome {
    if error.is_timeout() {
        FetchOutcome::Timeout
    } else if error.is_connect() {
        FetchOutcome::ConnectionError(format!("connect: {}", error))
    } else {
        FetchOutcome::ConnectionError(error.to_string())
    }
}

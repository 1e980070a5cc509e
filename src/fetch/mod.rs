//! HTTP fetching for target pages, robots.txt and sitemaps
//!
//! Two fetchers implement the same [`Fetcher`] contract:
//! - [`RetryingFetcher`]: one timeout, sequential retries with exponential backoff
//! - [`PooledFetcher`]: progressive per-attempt timeouts over a shared,
//!   keep-alive connection pool with DNS caching and a global in-flight bound
//!
//! Fetch failures are values ([`FetchOutcome`]), never errors.

mod client;
mod pooled;
mod retrying;

pub use client::{build_http_client, build_pooled_client};
pub use pooled::PooledFetcher;
pub use retrying::RetryingFetcher;

use crate::config::{Config, RunnerKind};
use crate::model::FailureReason;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Outcome of one HTTP GET after all attempts
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx with an acceptable body
    Success {
        /// Final URL after redirects
        final_url: Url,
        body: String,
    },

    /// 2xx HTML whose visible text is too short to be a server-rendered page
    Dynamic { final_url: Url, body: String },

    /// Every attempt timed out
    Timeout,

    /// Connection refused/reset, DNS or TLS failure on every attempt
    ConnectionError(String),

    /// Non-2xx response; never retried
    HttpError(u16),

    /// Declared Content-Type is not textual
    NotHtml(String),
}

impl FetchOutcome {
    /// Transient outcomes are retried; everything else is definitive
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::ConnectionError(_))
    }

    /// Short label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Dynamic { .. } => "dynamic",
            Self::Timeout => "timeout",
            Self::ConnectionError(_) => "connection_error",
            Self::HttpError(_) => "http_error",
            Self::NotHtml(_) => "not_html",
        }
    }
}

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was requested
    pub url: String,

    pub outcome: FetchOutcome,

    /// Number of requests issued (0 when the URL was unusable)
    pub attempts: u32,
}

impl FetchResult {
    /// Returns true for a 2xx page that passed validation
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Success { .. })
    }

    /// Body of a successful fetch
    pub fn body(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Final URL after redirects of a 2xx fetch
    pub fn final_url(&self) -> Option<&Url> {
        match &self.outcome {
            FetchOutcome::Success { final_url, .. } | FetchOutcome::Dynamic { final_url, .. } => {
                Some(final_url)
            }
            _ => None,
        }
    }

    /// Maps an unsuccessful fetch onto the target failure taxonomy
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match &self.outcome {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::Dynamic { .. } => Some(FailureReason::Dynamic),
            FetchOutcome::Timeout => Some(FailureReason::Timeout),
            FetchOutcome::ConnectionError(_) => Some(FailureReason::ConnectionError),
            FetchOutcome::HttpError(status) => Some(FailureReason::HttpError(*status)),
            FetchOutcome::NotHtml(_) => Some(FailureReason::NotHtml),
        }
    }
}

/// Single-URL HTTP GET contract shared by both scheduling models
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches an HTML page: Content-Type must be textual, and dynamic
    /// detection applies when enabled
    async fn fetch_page(&self, url: &str) -> FetchResult;

    /// Fetches a supporting document (robots.txt, sitemap) without content
    /// validation
    async fn fetch_document(&self, url: &str) -> FetchResult;

    /// Attempt budget for transient failures
    fn max_attempts(&self) -> u32;
}

/// Builds the fetcher matching a scheduling model
///
/// The worker pool uses the retrying fetcher; the concurrent runner uses the
/// pooled fetcher sized for `workers * per_host_concurrency` requests in flight.
pub fn build_fetcher(config: &Config) -> Result<Arc<dyn Fetcher>, reqwest::Error> {
    match config.runner.kind {
        RunnerKind::Pool => Ok(Arc::new(RetryingFetcher::new(config.fetch.clone())?)),
        RunnerKind::Concurrent => {
            let max_in_flight = config
                .runner
                .workers
                .saturating_mul(config.runner.per_host_concurrency)
                .max(1);
            Ok(Arc::new(PooledFetcher::new(
                config.fetch.clone(),
                max_in_flight,
            )?))
        }
    }
}

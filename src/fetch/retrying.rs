//! Sequential fetcher with exponential backoff

use crate::config::FetchConfig;
use crate::fetch::client::{attempt, build_http_client, jitter, FetchKind};
use crate::fetch::{FetchOutcome, FetchResult, Fetcher};
use crate::url::normalize_target_url;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Fetcher issuing up to `max_attempts` requests per URL
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Timeout | Retry, backoff doubles from `backoff_base_ms` |
/// | Connection refused/reset | Retry, backoff doubles from `backoff_base_ms` |
/// | HTTP non-2xx | Immediate, never retried |
/// | Non-textual Content-Type | Immediate, never retried |
pub struct RetryingFetcher {
    client: Client,
    config: FetchConfig,
}

impl RetryingFetcher {
    /// Creates a fetcher with its own HTTP client
    pub fn new(config: FetchConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// Backoff before the attempt following attempt number `attempt` (1-based)
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << (attempt.saturating_sub(1)).min(10);
        Duration::from_millis(self.config.backoff_base_ms.saturating_mul(factor))
    }

    async fn fetch(&self, raw_url: &str, kind: FetchKind) -> FetchResult {
        let url = match normalize_target_url(raw_url) {
            Ok(url) => url,
            Err(e) => {
                return FetchResult {
                    url: raw_url.to_string(),
                    outcome: FetchOutcome::ConnectionError(format!("unusable URL: {}", e)),
                    attempts: 0,
                }
            }
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let mut attempts = 0;

        loop {
            attempts += 1;
            jitter(&self.config).await;

            let outcome = attempt(&self.client, &url, timeout, kind, &self.config).await;

            if !outcome.is_transient() || attempts >= self.config.max_attempts {
                tracing::debug!(
                    "GET {} -> {} after {} attempt(s)",
                    url,
                    outcome.label(),
                    attempts
                );
                return FetchResult {
                    url: url.to_string(),
                    outcome,
                    attempts,
                };
            }

            let delay = self.backoff(attempts);
            tracing::debug!(
                "GET {} failed with {} (attempt {}/{}), retrying in {:?}",
                url,
                outcome.label(),
                attempts,
                self.config.max_attempts,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Fetcher for RetryingFetcher {
    async fn fetch_page(&self, url: &str) -> FetchResult {
        self.fetch(url, FetchKind::Page).await
    }

    async fn fetch_document(&self, url: &str) -> FetchResult {
        self.fetch(url, FetchKind::Document).await
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(base_ms: u64) -> RetryingFetcher {
        RetryingFetcher::new(FetchConfig {
            backoff_base_ms: base_ms,
            ..FetchConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_backoff_doubles() {
        let fetcher = fetcher(500);
        assert_eq!(fetcher.backoff(1), Duration::from_millis(500));
        assert_eq!(fetcher.backoff(2), Duration::from_millis(1000));
        assert_eq!(fetcher.backoff(3), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_unusable_url_is_not_requested() {
        let result = fetcher(0).fetch_page("not a url").await;
        assert_eq!(result.attempts, 0);
        assert!(matches!(result.outcome, FetchOutcome::ConnectionError(_)));
    }
}

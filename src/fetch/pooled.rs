//! High-throughput fetcher with progressive timeouts

use crate::config::FetchConfig;
use crate::fetch::client::{attempt, build_pooled_client, jitter, FetchKind};
use crate::fetch::{FetchOutcome, FetchResult, Fetcher};
use crate::url::normalize_target_url;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Fetcher sharing one connection pool across all targets
///
/// Attempt `n` uses the `n`-th entry of `progressive_timeouts_secs`
/// (e.g. 3s, 5s, 10s) and follows the previous one without a backoff sleep:
/// a slow host gets more patience instead of more waiting. A global
/// semaphore bounds the requests in flight across every target.
pub struct PooledFetcher {
    client: Client,
    config: FetchConfig,
    in_flight: Arc<Semaphore>,
}

impl PooledFetcher {
    /// Creates a fetcher allowing at most `max_in_flight` concurrent requests
    pub fn new(config: FetchConfig, max_in_flight: usize) -> Result<Self, reqwest::Error> {
        let client = build_pooled_client(&config)?;
        Ok(Self {
            client,
            config,
            in_flight: Arc::new(Semaphore::new(max_in_flight.max(1))),
        })
    }

    /// Timeouts applied to successive attempts
    fn timeouts(&self) -> impl Iterator<Item = Duration> + '_ {
        self.config
            .progressive_timeouts_secs
            .iter()
            .map(|secs| Duration::from_secs(*secs))
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

        jitter(&self.config).await;

        let mut attempts = 0;
        let mut outcome = FetchOutcome::Timeout;

        for timeout in self.timeouts() {
            attempts += 1;

            // acquire only fails on a closed semaphore; this one is never closed
            let Ok(_permit) = self.in_flight.acquire().await else {
                break;
            };

            outcome = attempt(&self.client, &url, timeout, kind, &self.config).await;
            if !outcome.is_transient() {
                break;
            }

            tracing::debug!(
                "GET {} failed with {} within {:?} (attempt {})",
                url,
                outcome.label(),
                timeout,
                attempts
            );
        }

        FetchResult {
            url: url.to_string(),
            outcome,
            attempts,
        }
    }
}

#[async_trait]
impl Fetcher for PooledFetcher {
    async fn fetch_page(&self, url: &str) -> FetchResult {
        self.fetch(url, FetchKind::Page).await
    }

    async fn fetch_document(&self, url: &str) -> FetchResult {
        self.fetch(url, FetchKind::Document).await
    }

    fn max_attempts(&self) -> u32 {
        self.config.progressive_timeouts_secs.len() as u32
    }
}

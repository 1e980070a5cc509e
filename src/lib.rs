//! Contact-Miner: a lead enrichment scraper
//!
//! This crate discovers, fetches and mines the pages of business websites for
//! contact signals (emails, phone numbers, clean text). A batch of targets is
//! driven through a bounded concurrent runner with checkpoint/resume support.

pub mod config;
pub mod discovery;
pub mod extract;
pub mod fetch;
pub mod input;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod runner;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Contact-Miner runs
///
/// Only errors that abort a whole run live here. Per-target failures are
/// carried as values on [`model::TargetResult`].
#[derive(Debug, Error)]
pub enum MinerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Input table errors; all of them are fatal before dispatch
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse input table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{0}' is missing from the input")]
    MissingColumn(String),

    #[error("Input contains no usable targets")]
    Empty,
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Contact-Miner runs
pub type Result<T> = std::result::Result<T, MinerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{FailureReason, Target, TargetResult, TargetStatus};
pub use runner::{run_batch, RunContext, RunReport, ShutdownSignal};
pub use url::normalize_target_url;

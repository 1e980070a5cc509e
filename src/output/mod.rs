//! Output module: result rows, run analytics and the markdown summary
//!
//! This module handles:
//! - Shaping target results into flat partition rows
//! - Accumulating run counters and finalizing `analytics.json`
//! - Rendering `summary.md`

mod analytics;
mod markdown;
mod rows;

pub use analytics::{write_analytics, FailureBucket, InputSummary, RunAnalytics, RunCounters};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use rows::{rows_for, OutputRow, CELL_SEPARATOR};

use thiserror::Error;

/// File name of the analytics record inside the output directory
pub const ANALYTICS_FILE: &str = "analytics.json";

/// File name of the markdown summary inside the output directory
pub const SUMMARY_FILE: &str = "summary.md";

/// Errors that can occur while writing run reports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

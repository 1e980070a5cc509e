//! Result sink trait and storage error types
//!
//! This module defines the trait interface for output backends and the
//! associated error types.

use crate::output::OutputRow;
use thiserror::Error;

/// Errors that can occur during persistence
///
/// All of them are fatal to a run: losing rows or the checkpoint would break
/// resumption.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Flush task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The three logical output partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Successful targets
    Success,

    /// Failed targets
    Failed,

    /// Every target, annotated by its `status` column
    AllCombined,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Self::Success, Self::Failed, Self::AllCombined];

    /// Table name, and file stem of delimited outputs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::AllCombined => "all_combined",
        }
    }
}

/// Trait for output backends receiving flushed rows
///
/// A flush hands every sink the rows of each partition. Appends must be
/// durable when they return: the checkpoint written afterwards claims those
/// rows are persisted.
pub trait ResultSink: Send {
    /// Short backend name for log lines
    fn name(&self) -> &'static str;

    /// Appends rows to one partition
    ///
    /// # Arguments
    ///
    /// * `partition` - Destination partition
    /// * `rows` - Rows to append; may be empty
    fn append(&mut self, partition: Partition, rows: &[OutputRow]) -> StorageResult<()>;
}

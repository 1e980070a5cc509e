//! Storage module for persisting run results and progress
//!
//! This module handles:
//! - The checkpoint file used to resume interrupted runs
//! - Result sinks for the output partitions (CSV files, SQLite tables)

mod checkpoint;
mod csv_sink;
mod schema;
mod sqlite;
mod traits;

pub use checkpoint::Checkpoint;
pub use csv_sink::CsvSink;
pub use sqlite::{SqliteSink, SQLITE_FILE};
pub use traits::{Partition, ResultSink, StorageError, StorageResult};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;

/// Opens the result sinks selected by the output configuration
///
/// # Arguments
///
/// * `config` - Output configuration (formats)
/// * `directory` - Output directory, created if missing
/// * `fresh` - Discard output left by a previous run instead of appending
///
/// # Returns
///
/// * `Ok(Vec<Box<dyn ResultSink>>)` - One sink per configured format
/// * `Err(StorageError)` - A sink could not be opened
pub fn open_sinks(
    config: &OutputConfig,
    directory: &Path,
    fresh: bool,
) -> StorageResult<Vec<Box<dyn ResultSink>>> {
    std::fs::create_dir_all(directory)?;

    let mut sinks: Vec<Box<dyn ResultSink>> = Vec::new();
    for format in &config.formats {
        match format {
            OutputFormat::Csv => sinks.push(Box::new(CsvSink::new(directory, fresh)?)),
            OutputFormat::Sqlite => sinks.push(Box::new(SqliteSink::new(
                &directory.join(SQLITE_FILE),
                fresh,
            )?)),
        }
    }

    Ok(sinks)
}

//! Delimited-text result sink: one CSV file per partition

use crate::output::OutputRow;
use crate::storage::traits::{Partition, ResultSink, StorageResult};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// CSV output backend writing `<partition>.csv` files
///
/// Each append opens the file in append mode and writes the header only
/// when the file is new or empty, so resumed runs extend earlier output.
pub struct CsvSink {
    directory: PathBuf,
}

impl CsvSink {
    /// Creates a sink in `directory`
    ///
    /// With `fresh`, partition files left by a previous run are removed.
    pub fn new(directory: &Path, fresh: bool) -> StorageResult<Self> {
        fs::create_dir_all(directory)?;
        let sink = Self {
            directory: directory.to_path_buf(),
        };

        if fresh {
            for partition in Partition::ALL {
                let path = sink.path_for(partition);
                if path.exists() {
                    fs::remove_file(&path)?;
                }
            }
        }

        Ok(sink)
    }

    /// File path of a partition
    pub fn path_for(&self, partition: Partition) -> PathBuf {
        self.directory.join(format!("{}.csv", partition.name()))
    }
}

impl ResultSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn append(&mut self, partition: Partition, rows: &[OutputRow]) -> StorageResult<()> {
        let path = self.path_for(partition);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(OutputRow::COLUMNS)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        Ok(())
    }
}

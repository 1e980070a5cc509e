//! SQLite result sink
//!
//! This module stores the output partitions as tables of one SQLite database.

use crate::output::OutputRow;
use crate::storage::schema::{clear_partitions, initialize_schema};
use crate::storage::traits::{Partition, ResultSink, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// File name of the results database inside the output directory
pub const SQLITE_FILE: &str = "results.sqlite";

/// SQLite output backend
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens or creates the results database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `fresh` - Delete rows left by a previous run
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path, fresh: bool) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        if fresh {
            clear_partitions(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Counts the rows of a partition
    pub fn count(&self, partition: Partition) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", partition.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl ResultSink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn append(&mut self, partition: Partition, rows: &[OutputRow]) -> StorageResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (target_id, name, url, status, failure_reason, email, email_source, phones, site_type, discovery, text, extra, written_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                partition.name()
            ))?;

            for row in rows {
                stmt.execute(params![
                    row.target_id,
                    row.name,
                    row.url,
                    row.status,
                    row.failure_reason,
                    row.email,
                    row.email_source,
                    row.phones,
                    row.site_type,
                    row.discovery,
                    row.text,
                    row.extra,
                    now,
                ])?;
            }
        }
        tx.commit()?;

        Ok(())
    }
}

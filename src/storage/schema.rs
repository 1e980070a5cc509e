//! Database schema definitions
//!
//! This module contains the SQL schema of the results database. The three
//! partition tables share one column layout, matching the CSV outputs.

use crate::storage::Partition;

/// Column definitions shared by every partition table
const PARTITION_COLUMNS: &str = "
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    target_id TEXT NOT NULL,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    status TEXT NOT NULL,
    failure_reason TEXT NOT NULL,
    email TEXT NOT NULL,
    email_source TEXT NOT NULL,
    phones TEXT NOT NULL,
    site_type TEXT NOT NULL,
    discovery TEXT NOT NULL,
    text TEXT NOT NULL,
    extra TEXT NOT NULL,
    written_at TEXT NOT NULL
";

/// Builds the schema for all partition tables
pub fn schema_sql() -> String {
    let mut sql = String::new();
    for partition in Partition::ALL {
        let table = partition.name();
        sql.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {table} ({PARTITION_COLUMNS});\n\
             CREATE INDEX IF NOT EXISTS idx_{table}_target ON {table}(target_id);\n"
        ));
    }
    sql
}

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&schema_sql())?;
    Ok(())
}

/// Drops every row of the partition tables (fresh runs)
pub fn clear_partitions(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    for partition in Partition::ALL {
        conn.execute(&format!("DELETE FROM {}", partition.name()), [])?;
    }
    Ok(())
}

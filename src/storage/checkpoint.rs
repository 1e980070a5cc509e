//! Checkpoint file: completed targets and accumulated counters
//!
//! The checkpoint only ever names targets whose rows have already been
//! appended to the outputs. It is replaced atomically: a temporary file in
//! the same directory is written, synced and renamed over the old one.

use crate::output::RunCounters;
use crate::storage::StorageResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Persisted progress of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Checkpoint {
    /// RFC 3339 time of the last save
    pub timestamp: String,

    /// Identifiers of completed targets
    pub completed: BTreeSet<String>,

    /// Emails found by completed targets
    pub emails_found: u64,

    /// Counters over completed targets
    pub counters: RunCounters,

    /// Fingerprint of the settings that shape results
    pub fingerprint: Option<String>,
}

impl Checkpoint {
    /// Creates an empty checkpoint for a fresh run
    pub fn new(fingerprint: Option<String>) -> Self {
        Self {
            fingerprint,
            ..Self::default()
        }
    }

    /// Loads a checkpoint file
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Checkpoint))` - The file exists and parsed
    /// * `Ok(None)` - No checkpoint at this path
    /// * `Err(StorageError)` - The file exists but cannot be read or parsed
    pub fn load(path: &Path) -> StorageResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Returns true if the target was completed by an earlier flush
    pub fn is_completed(&self, target_id: &str) -> bool {
        self.completed.contains(target_id)
    }

    /// Writes the checkpoint, replacing any previous file atomically
    pub fn save_atomic(&mut self, path: &Path) -> StorageResult<()> {
        self.timestamp = Utc::now().to_rfc3339();

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(directory)?;

        let temp = NamedTempFile::new_in(directory)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, &*self)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Checkpoint::load(&dir.path().join("none.json")).unwrap(), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("checkpoint.json");

        let mut checkpoint = Checkpoint::new(Some("abc".to_string()));
        checkpoint.completed.insert("acme.test".to_string());
        checkpoint.emails_found = 3;
        checkpoint.counters.attempted = 1;
        checkpoint.save_atomic(&path).unwrap();

        let loaded = Checkpoint::load(&path).unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
        assert!(loaded.is_completed("acme.test"));
        assert!(!loaded.timestamp.is_empty());
    }

    #[test]
    fn test_save_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        let mut checkpoint = Checkpoint::new(None);
        checkpoint.save_atomic(&path).unwrap();
        checkpoint.completed.insert("b.test".to_string());
        checkpoint.save_atomic(&path).unwrap();

        let loaded = Checkpoint::load(&path).unwrap().unwrap();
        assert_eq!(loaded.completed.len(), 1);
        // No temporary files are left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Checkpoint::load(&path).is_err());
    }
}

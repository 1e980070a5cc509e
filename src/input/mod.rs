//! Input table reading
//!
//! Targets come from a CSV file with a header row. One column holds the URL
//! (or bare host), another optionally holds a display name; every other
//! column is carried through untouched to the output `extra` cell.

use crate::config::InputConfig;
use crate::model::Target;
use crate::url::normalize_target_url;
use crate::InputError;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Counts reported about the input table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputStats {
    /// Data rows read
    pub rows: usize,

    /// Rows without a usable URL
    pub invalid: usize,

    /// Rows naming a site already seen earlier in the table
    pub duplicates: usize,
}

/// Targets read from an input table
#[derive(Debug, Clone)]
pub struct LoadedInput {
    /// Unique targets in input order
    pub targets: Vec<Target>,
    pub stats: InputStats,
}

/// Loads targets from the configured input file
///
/// # Arguments
///
/// * `config` - Input configuration (path, column names, row limit)
///
/// # Returns
///
/// * `Ok(LoadedInput)` - At least one valid target
/// * `Err(InputError)` - Unreadable file, missing URL column or no valid rows
pub fn load_targets(config: &InputConfig) -> Result<LoadedInput, InputError> {
    let path = Path::new(&config.path);
    let file = File::open(path)?;
    debug!("Reading targets from {}", path.display());
    read_targets(file, config)
}

/// Reads targets from any CSV source
///
/// Rows whose URL does not normalize are counted as invalid, and rows whose
/// site was already listed are counted as duplicates; neither is an error.
/// With a limit, reading stops after that many valid targets.
pub fn read_targets<R: Read>(source: R, config: &InputConfig) -> Result<LoadedInput, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let url_index = find_column(&headers, &config.url_column)
        .ok_or_else(|| InputError::MissingColumn(config.url_column.clone()))?;
    let name_index = match &config.name_column {
        Some(name) => {
            let index = find_column(&headers, name);
            if index.is_none() {
                warn!("Name column '{}' not found, targets will be unnamed", name);
            }
            index
        }
        None => None,
    };

    let mut stats = InputStats::default();
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for record in reader.records() {
        let record = record?;
        stats.rows += 1;

        let raw_url = record.get(url_index).unwrap_or("").trim();
        let url = match normalize_target_url(raw_url) {
            Ok(url) => url,
            Err(e) => {
                debug!("Skipping row {}: '{}' ({})", stats.rows, raw_url, e);
                stats.invalid += 1;
                continue;
            }
        };

        let name = name_index
            .and_then(|i| record.get(i))
            .map(|n| n.trim().to_string());
        let Some(target) = Target::new(url, name) else {
            stats.invalid += 1;
            continue;
        };

        if !seen.insert(target.id.clone()) {
            stats.duplicates += 1;
            continue;
        }

        let extra: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != url_index && Some(*i) != name_index)
            .filter_map(|(i, header)| {
                let value = record.get(i)?.trim();
                (!value.is_empty() && !header.is_empty())
                    .then(|| (header.clone(), value.to_string()))
            })
            .collect();

        targets.push(target.with_extra(extra));

        if config.limit.map_or(false, |limit| targets.len() >= limit) {
            break;
        }
    }

    if targets.is_empty() {
        return Err(InputError::Empty);
    }

    Ok(LoadedInput { targets, stats })
}

/// Finds a column by case-insensitive name
fn find_column(headers: &[String], wanted: &str) -> Option<usize> {
    let wanted = wanted.trim();
    headers.iter().position(|h| h.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InputConfig {
        InputConfig::default()
    }

    #[test]
    fn test_reads_targets_and_extra_columns() {
        let csv = "Name,Website,City\nAcme,acme.test,Duluth\nBolt Co,https://www.bolt.test/home,\n";
        let loaded = read_targets(csv.as_bytes(), &config()).unwrap();

        assert_eq!(loaded.targets.len(), 2);
        assert_eq!(loaded.targets[0].id, "acme.test");
        assert_eq!(loaded.targets[0].name.as_deref(), Some("Acme"));
        assert_eq!(loaded.targets[0].url.as_str(), "https://acme.test/");
        assert_eq!(loaded.targets[0].extra["City"], "Duluth");
        assert_eq!(loaded.targets[1].id, "bolt.test");
        assert!(loaded.targets[1].extra.is_empty());
        assert_eq!(loaded.stats.rows, 2);
    }

    #[test]
    fn test_invalid_and_duplicate_rows_are_counted() {
        let csv = "name,website\nA,acme.test\nB,\nC,mailto:x@y.test\nD,www.acme.test\nE,localhost\n";
        let loaded = read_targets(csv.as_bytes(), &config()).unwrap();

        assert_eq!(loaded.targets.len(), 1);
        assert_eq!(
            loaded.stats,
            InputStats {
                rows: 5,
                invalid: 3,
                duplicates: 1
            }
        );
    }

    #[test]
    fn test_missing_url_column() {
        let csv = "name,site\nA,acme.test\n";
        let err = read_targets(csv.as_bytes(), &config()).unwrap_err();
        assert!(matches!(err, InputError::MissingColumn(c) if c == "website"));
    }

    #[test]
    fn test_empty_input() {
        let err = read_targets("website\n".as_bytes(), &config()).unwrap_err();
        assert!(matches!(err, InputError::Empty));
    }

    #[test]
    fn test_limit_stops_reading() {
        let csv = "website\na.test\nb.test\nc.test\n";
        let mut config = config();
        config.limit = Some(2);
        let loaded = read_targets(csv.as_bytes(), &config).unwrap();

        assert_eq!(loaded.targets.len(), 2);
        assert_eq!(loaded.stats.rows, 2);
    }

    #[test]
    fn test_missing_name_column_is_tolerated() {
        let csv = "website\nacme.test\n";
        let loaded = read_targets(csv.as_bytes(), &config()).unwrap();
        assert_eq!(loaded.targets[0].name, None);
    }

    #[test]
    fn test_load_targets_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"website\nacme.test\n").unwrap();

        let mut config = config();
        config.path = file.path().to_string_lossy().to_string();

        assert_eq!(load_targets(&config).unwrap().targets.len(), 1);
    }
}

use crate::config::types::{Config, DiscoveryConfig, EmailCardinality, ScrapeConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use contact_miner::config::load_config;
///
/// let config = load_config(Path::new("miner.toml")).unwrap();
/// println!("Workers: {}", config.runner.workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Settings that change what a completed target's row looks like
///
/// Resume-only knobs (limit, resume flag, worker counts) are left out so an
/// interrupted run can be resumed with a different row limit or parallelism.
#[derive(Serialize)]
struct Fingerprint<'a> {
    input_path: &'a str,
    url_column: &'a str,
    name_column: Option<&'a str>,
    email_output: EmailCardinality,
    scrape: &'a ScrapeConfig,
    discovery: &'a DiscoveryConfig,
}

/// Computes a SHA-256 fingerprint of the result-affecting settings
///
/// This is stored in the checkpoint and compared on resume to detect a
/// configuration change between the interrupted and the resumed run.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash
/// * `Err(ConfigError)` - The settings could not be serialized
pub fn compute_config_hash(config: &Config) -> Result<String, ConfigError> {
    let fingerprint = Fingerprint {
        input_path: &config.input.path,
        url_column: &config.input.url_column,
        name_column: config.input.name_column.as_deref(),
        email_output: config.output.email_output,
        scrape: &config.scrape,
        discovery: &config.discovery,
    };
    let bytes = serde_json::to_vec(&fingerprint)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[input]
path = "leads.csv"
url-column = "Website"
name-column = "Company"

[output]
directory = "./out"
formats = ["csv"]
email-output = "one-per-row"

[scrape]
mode = "homepage-only"

[runner]
kind = "pool"
workers = 8
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.input.url_column, "Website");
        assert_eq!(config.input.name_column.as_deref(), Some("Company"));
        assert_eq!(config.output.email_output, EmailCardinality::OnePerRow);
        assert_eq!(config.scrape.mode, ScrapeMode::HomepageOnly);
        assert_eq!(config.runner.workers, 8);
        // Untouched sections keep their defaults
        assert_eq!(config.discovery.max_pages, 5);
        assert_eq!(config.checkpoint.interval, 100);
    }

    #[test]
    fn test_empty_config_is_valid() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.progressive_timeouts_secs, vec![3, 5, 10]);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/miner.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[runner]\nworkers = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_hash_ignores_resume_knobs() {
        let mut a = Config::default();
        a.input.path = "leads.csv".to_string();
        let mut b = a.clone();
        b.checkpoint.resume = true;
        b.input.limit = Some(10);
        b.runner.workers = 3;

        let hash_a = compute_config_hash(&a).unwrap();
        assert_eq!(hash_a, compute_config_hash(&b).unwrap());
        assert_eq!(hash_a.len(), 64);
    }

    #[test]
    fn test_hash_tracks_result_settings() {
        let a = Config::default();
        let mut b = a.clone();
        b.scrape.mode = ScrapeMode::HomepageOnly;

        assert_ne!(
            compute_config_hash(&a).unwrap(),
            compute_config_hash(&b).unwrap()
        );
    }
}

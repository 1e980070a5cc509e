use crate::config::types::{
    CheckpointConfig, Config, DiscoveryConfig, FetchConfig, InputConfig, OutputConfig,
    RunnerConfig, ScrapeConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    validate_fetch_config(&config.fetch)?;
    validate_discovery_config(&config.discovery)?;
    validate_scrape_config(&config.scrape)?;
    validate_runner_config(&config.runner)?;
    validate_checkpoint_config(&config.checkpoint)?;
    Ok(())
}

/// Validates input configuration
///
/// The input path itself may still be empty here; it is usually supplied on
/// the command line and checked when the table is opened.
fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.url_column.trim().is_empty() {
        return Err(ConfigError::Validation(
            "url_column cannot be empty".to_string(),
        ));
    }

    if let Some(name_column) = &config.name_column {
        if name_column.trim().is_empty() {
            return Err(ConfigError::Validation(
                "name_column cannot be empty when set".to_string(),
            ));
        }
    }

    if config.limit == Some(0) {
        return Err(ConfigError::Validation(
            "limit must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.formats.is_empty() {
        return Err(ConfigError::Validation(
            "at least one output format is required".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.jitter_min_ms > config.jitter_max_ms {
        return Err(ConfigError::Validation(format!(
            "jitter_min_ms ({}) cannot exceed jitter_max_ms ({})",
            config.jitter_min_ms, config.jitter_max_ms
        )));
    }

    if config.progressive_timeouts_secs.is_empty() {
        return Err(ConfigError::Validation(
            "progressive_timeouts_secs needs at least one entry".to_string(),
        ));
    }

    if config.progressive_timeouts_secs.contains(&0) {
        return Err(ConfigError::Validation(
            "progressive_timeouts_secs entries must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates discovery configuration
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > 50 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and 50, got {}",
            config.max_pages
        )));
    }

    if config.max_child_sitemaps > 100 {
        return Err(ConfigError::Validation(format!(
            "max_child_sitemaps must be <= 100, got {}",
            config.max_child_sitemaps
        )));
    }

    Ok(())
}

/// Validates scrape configuration
fn validate_scrape_config(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.max_text_chars == 0 {
        return Err(ConfigError::Validation(
            "max_text_chars must be >= 1".to_string(),
        ));
    }

    if config.max_emails_per_page == 0 {
        return Err(ConfigError::Validation(
            "max_emails_per_page must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates runner configuration
fn validate_runner_config(config: &RunnerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 1000 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 1000, got {}",
            config.workers
        )));
    }

    if config.per_host_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "per_host_concurrency must be >= 1, got {}",
            config.per_host_concurrency
        )));
    }

    Ok(())
}

/// Validates checkpoint configuration
fn validate_checkpoint_config(config: &CheckpointConfig) -> Result<(), ConfigError> {
    if config.interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint interval must be >= 1, got {}",
            config.interval
        )));
    }

    if config.max_buffered_rows < 1 {
        return Err(ConfigError::Validation(format!(
            "max_buffered_rows must be >= 1, got {}",
            config.max_buffered_rows
        )));
    }

    Ok(())
}

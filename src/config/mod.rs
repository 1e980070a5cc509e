//! Configuration module for Contact-Miner
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key is optional; flags given on the command line are applied
//! on top of the file by the binary.
//!
//! # Example
//!
//! ```no_run
//! use contact_miner::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("miner.toml")).unwrap();
//! println!("Deep search will visit up to {} pages", config.discovery.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CheckpointConfig, Config, DiscoveryConfig, EmailCardinality, FetchConfig, InputConfig,
    OutputConfig, OutputFormat, RunnerConfig, RunnerKind, ScrapeConfig, ScrapeMode,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config};
pub use validation::validate;

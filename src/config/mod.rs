//! Configuration module for Sumi-Harvest
//!
//! This module handles loading, parsing, and validating TOML job files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("job.toml")).unwrap();
//! println!("Scraping {} field(s)", config.fields.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, FetcherConfig, JobConfig, OutputConfig, PolitenessConfig, RetryConfig,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

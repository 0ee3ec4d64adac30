//! Configuration module for SiteSage
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_sage::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitesage.toml")).unwrap();
//! println!("Probe concurrency: {}", config.audit.max_concurrent_probes);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AuditConfig, Config, FetcherConfig, InsightsConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    hash_content, load_config, load_config_or_default, load_config_with_hash, parse_config,
};

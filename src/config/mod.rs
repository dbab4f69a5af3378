//! Configuration module for Job-Trawler
//!
//! This module handles loading, parsing, and validating the TOML roster and
//! crawler settings.
//!
//! # Example
//!
//! ```no_run
//! use job_trawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("job_boards.toml")).unwrap();
//! println!("Sites in roster: {}", config.sites.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    file_stem, Config, CrawlerConfig, EngineKind, OutputConfig, RotationConfig, Roster,
    SelectorConfig, SiteConfig, SpiderConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

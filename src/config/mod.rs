//! Configuration module for Link-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Library callers can also build a `CrawlSettings` directly; its `Default`
//! carries the stock crawl behavior.
//!
//! # Example
//!
//! ```no_run
//! use link_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.threads);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlSettings, OutputConfig, SinkKind, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

// Re-export validation entry points
pub use validation::{validate, validate_settings};

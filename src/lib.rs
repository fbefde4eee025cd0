//! Link-Ripple: a bounded multi-worker link crawler
//!
//! This crate implements a self-contained crawl engine: seed URLs are fetched by a
//! fixed pool of workers, outbound links are extracted, filtered and deduplicated,
//! and admitted links are fed back into a shared frontier until every worker is idle.

pub mod config;
pub mod crawler;
pub mod filter;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Link-Ripple operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("A crawl is already running on this crawler")]
    AlreadyRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are raised at startup only; a running crawl never produces one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Membership filter error: {0}")]
    Filter(#[from] filter::FilterError),
}

/// Result type alias for Link-Ripple operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, CrawlSettings};
pub use crawler::{CrawlListener, Crawler, UrlWorkItem};
pub use filter::BloomFilter;
pub use state::WorkerState;
pub use storage::LinkSink;

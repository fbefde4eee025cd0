//! Storage module for recording discovered links
//!
//! This module handles everything downstream of link admission:
//! - The `LinkSink` interface the crawler's admission hook talks to
//! - `LinkStore`, which deduplicates through a membership filter and enforces a
//!   capacity ceiling
//! - Writer backends: append-only file, stdout, SQLite and memory

mod link_store;
mod schema;
mod sqlite;
mod traits;
mod writers;

pub use link_store::LinkStore;
pub use schema::initialize_schema;
pub use sqlite::SqliteLinkWriter;
pub use traits::{LinkSink, LinkWriter, StorageError, StorageResult};
pub use writers::{FileLinkWriter, MemoryLinkWriter, StdoutLinkWriter};

use crate::config::{OutputConfig, SinkKind};
use crate::{ConfigError, CrawlError};
use std::path::Path;

/// A link store over whichever writer the configuration selects
pub type DynLinkStore = LinkStore<Box<dyn LinkWriter>>;

/// Opens the sink described by the output configuration
///
/// # Arguments
///
/// * `config` - Output configuration (sink kind, path, capacity, error rate)
///
/// # Returns
///
/// * `Ok(DynLinkStore)` - Ready to record links
/// * `Err(CrawlError)` - Missing path, unusable file or database, or a filter that
///   cannot be sized
pub fn open_sink(config: &OutputConfig) -> Result<DynLinkStore, CrawlError> {
    let writer: Box<dyn LinkWriter> = match config.sink {
        SinkKind::Stdout => Box::new(StdoutLinkWriter::new()),
        SinkKind::Memory => Box::new(MemoryLinkWriter::new()),
        SinkKind::File => Box::new(FileLinkWriter::open(sink_path(config)?)?),
        SinkKind::Sqlite => Box::new(SqliteLinkWriter::new(sink_path(config)?)?),
    };

    tracing::debug!("Opened {:?} link sink", config.sink);

    Ok(LinkStore::from_config(writer, config)?)
}

fn sink_path(config: &OutputConfig) -> Result<&Path, ConfigError> {
    config
        .path
        .as_deref()
        .filter(|path| !path.is_empty())
        .map(Path::new)
        .ok_or_else(|| {
            ConfigError::Validation(format!(
                "output path is required for the {:?} sink",
                config.sink
            ))
        })
}

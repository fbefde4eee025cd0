//! Storage traits and error types
//!
//! This module defines the sink interface consumed by the crawler and the writer
//! interface implemented by each storage backend.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Deduplicating record of discovered links
///
/// Implementations must be safe to call from every crawl worker at once.
pub trait LinkSink: Send + Sync {
    /// Records a URL
    ///
    /// Returns false if the URL was already recorded or the sink is full.
    fn try_add(&self, url: &str) -> bool;

    /// Number of URLs recorded so far
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Backend that persists accepted links, one at a time
pub trait LinkWriter: Send {
    /// Appends one URL
    fn write_link(&mut self, url: &str) -> StorageResult<()>;

    /// Flushes any buffered output
    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }
}

impl<W: LinkWriter + ?Sized> LinkWriter for Box<W> {
    fn write_link(&mut self, url: &str) -> StorageResult<()> {
        (**self).write_link(url)
    }

    fn flush(&mut self) -> StorageResult<()> {
        (**self).flush()
    }
}

//! Plain link writers: append-only file, stdout and memory

use crate::storage::traits::{LinkWriter, StorageResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Appends one URL per line to a file
pub struct FileLinkWriter {
    file: LineWriter<File>,
}

impl FileLinkWriter {
    /// Opens `path` for appending, creating it if needed
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: LineWriter::new(file),
        })
    }
}

impl LinkWriter for FileLinkWriter {
    fn write_link(&mut self, url: &str) -> StorageResult<()> {
        writeln!(self.file, "{}", url)?;
        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.flush()?;
        Ok(())
    }
}

/// Prints one URL per line to stdout
#[derive(Debug, Default)]
pub struct StdoutLinkWriter;

impl StdoutLinkWriter {
    pub fn new() -> Self {
        Self
    }
}

impl LinkWriter for StdoutLinkWriter {
    fn write_link(&mut self, url: &str) -> StorageResult<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", url)?;
        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        std::io::stdout().flush()?;
        Ok(())
    }
}

/// Keeps links in memory
///
/// Clones share the same list, so a clone kept by the caller can read what the
/// sink recorded.
#[derive(Debug, Default, Clone)]
pub struct MemoryLinkWriter {
    links: Arc<Mutex<Vec<String>>>,
}

impl MemoryLinkWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded links, in insertion order
    pub fn links(&self) -> Vec<String> {
        self.links.lock().clone()
    }
}

impl LinkWriter for MemoryLinkWriter {
    fn write_link(&mut self, url: &str) -> StorageResult<()> {
        self.links.lock().push(url.to_string());
        Ok(())
    }
}

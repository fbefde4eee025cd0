//! Bloom-backed deduplicating link sink with a hard capacity ceiling

use crate::config::OutputConfig;
use crate::filter::BloomFilter;
use crate::storage::traits::{LinkSink, LinkWriter, StorageResult};
use crate::ConfigError;
use parking_lot::Mutex;

/// Accepted links between two progress log lines
const PROGRESS_INTERVAL: u64 = 100;

/// A [`LinkSink`] that remembers links in a membership filter and forwards new
/// ones to a [`LinkWriter`]
///
/// The filter is sized for `max_links` items. Because it never reports false
/// negatives, a recorded link is never accepted twice; a false positive may drop a
/// link that was never seen.
pub struct LinkStore<W> {
    filter: BloomFilter<str>,
    max_links: u64,
    inner: Mutex<StoreInner<W>>,
}

struct StoreInner<W> {
    writer: W,
    count: u64,
    full_reported: bool,
}

impl<W: LinkWriter> LinkStore<W> {
    /// Creates a store
    ///
    /// # Arguments
    ///
    /// * `writer` - Backend receiving accepted links
    /// * `max_links` - Capacity ceiling, also the filter's sizing capacity
    /// * `error_rate` - Filter error rate; `None` picks `1 / max_links`
    ///
    /// # Returns
    ///
    /// * `Ok(LinkStore)` - Empty store
    /// * `Err(ConfigError)` - The filter cannot be sized from these parameters
    pub fn new(writer: W, max_links: u64, error_rate: Option<f64>) -> Result<Self, ConfigError> {
        let filter = match error_rate {
            Some(rate) => BloomFilter::with_error_rate(max_links, rate)?,
            None => BloomFilter::new(max_links)?,
        };

        Ok(Self {
            filter,
            max_links,
            inner: Mutex::new(StoreInner {
                writer,
                count: 0,
                full_reported: false,
            }),
        })
    }

    /// Creates a store sized from the output configuration
    pub fn from_config(writer: W, config: &OutputConfig) -> Result<Self, ConfigError> {
        Self::new(writer, config.max_links, config.filter_error_rate())
    }

    pub fn max_links(&self) -> u64 {
        self.max_links
    }

    /// Fraction of filter bits set
    pub fn saturation(&self) -> f64 {
        self.filter.truthiness()
    }

    /// Flushes the underlying writer
    pub fn flush(&self) -> StorageResult<()> {
        self.inner.lock().writer.flush()
    }
}

impl<W: LinkWriter> LinkSink for LinkStore<W> {
    fn try_add(&self, url: &str) -> bool {
        // the whole check-write-mark sequence runs under one lock
        let mut inner = self.inner.lock();

        if self.filter.contains(url) {
            return false;
        }

        if inner.count >= self.max_links {
            if !inner.full_reported {
                inner.full_reported = true;
                tracing::warn!(
                    "Link sink is full at {} links, further links are dropped",
                    self.max_links
                );
            }
            return false;
        }

        if let Err(e) = inner.writer.write_link(url) {
            tracing::warn!("Failed to record {}: {}", url, e);
            return false;
        }

        self.filter.add(url);
        inner.count += 1;

        if inner.count % PROGRESS_INTERVAL == 0 {
            tracing::info!("Recorded {} links", inner.count);
        }

        true
    }

    fn len(&self) -> u64 {
        self.inner.lock().count
    }
}

//! Shared FIFO work queue
//!
//! One `FrontierQueue` exists per crawl run and is handed to every worker. The
//! length is read under the same lock as enqueue/dequeue, so a worker checking for
//! termination never sees a stale count after another worker pushed work.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// A URL waiting to be fetched, with its hop count from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlWorkItem {
    /// Absolute URL to fetch
    pub url: String,

    /// Link hops from the seed; seeds are depth 1
    pub depth: u32,
}

impl UrlWorkItem {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }

    /// Builds the work item for a link discovered on this page
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self::new(url, self.depth.saturating_add(1))
    }
}

/// Thread-safe FIFO of pending work items
#[derive(Debug, Default)]
pub struct FrontierQueue {
    items: Mutex<VecDeque<UrlWorkItem>>,
}

impl FrontierQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item to the back of the queue
    pub fn enqueue(&self, item: UrlWorkItem) {
        self.items.lock().push_back(item);
    }

    /// Removes and returns the oldest item, if any
    pub fn dequeue(&self) -> Option<UrlWorkItem> {
        self.items.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drops every pending item
    pub fn clear(&self) {
        self.items.lock().clear();
    }
}

//! Observer hooks published by a running crawl
//!
//! A crawl reports to a single [`CrawlListener`]. Fan-out to several consumers is
//! done by composing listeners, not by registering more than one.

use crate::crawler::FetchError;
use crate::storage::LinkSink;
use std::sync::Arc;

/// A page that was fetched and decoded
#[derive(Debug, Clone, Copy)]
pub struct FetchedPage<'a> {
    pub url: &'a str,
    pub depth: u32,
    pub html: &'a str,
}

/// A link that passed the built-in filters and awaits admission
#[derive(Debug, Clone, Copy)]
pub struct DiscoveredLink<'a> {
    pub url: &'a str,
    /// Depth the link would be crawled at
    pub depth: u32,
    pub anchor_text: &'a str,
}

/// Callbacks invoked by crawl workers
///
/// Methods are called concurrently from every worker, so implementations must be
/// cheap and internally synchronized.
pub trait CrawlListener: Send + Sync {
    /// Called for every successfully fetched page, including pages at the depth limit
    fn on_page_fetched(&self, _page: &FetchedPage<'_>) {}

    /// Decides whether a discovered link is admitted to the frontier
    ///
    /// Returning `false` drops the link. The default admits everything, which
    /// crawls in circles on sites whose pages link to each other unless a depth
    /// limit is set.
    fn on_link_discovered(&self, _link: &DiscoveredLink<'_>) -> bool {
        true
    }

    /// Called when a fetch fails; the URL is dropped afterwards
    fn on_error(&self, _url: &str, _error: &FetchError) {}
}

/// Listener that ignores pages and admits every link
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl CrawlListener for NoopListener {}

type PageHandler = Box<dyn Fn(&FetchedPage<'_>) + Send + Sync>;

/// Listener that deduplicates and records links through a [`LinkSink`]
///
/// A link is admitted only if the sink accepts it, so every URL is crawled at most
/// once (up to the sink's membership filter) and the sink's capacity ceiling also
/// bounds the crawl.
pub struct SinkListener<S> {
    sink: Arc<S>,
    page_handler: Option<PageHandler>,
}

impl<S: LinkSink> SinkListener<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            sink,
            page_handler: None,
        }
    }

    /// Registers a callback for fetched pages
    pub fn with_page_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&FetchedPage<'_>) + Send + Sync + 'static,
    {
        self.page_handler = Some(Box::new(handler));
        self
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }
}

impl<S: LinkSink> CrawlListener for SinkListener<S> {
    fn on_page_fetched(&self, page: &FetchedPage<'_>) {
        if let Some(handler) = &self.page_handler {
            handler(page);
        }
    }

    fn on_link_discovered(&self, link: &DiscoveredLink<'_>) -> bool {
        self.sink.try_add(link.url)
    }

    fn on_error(&self, url: &str, error: &FetchError) {
        tracing::warn!("Failed to fetch {}: {}", url, error);
    }
}

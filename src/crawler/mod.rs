//! Crawler module for page fetching and link discovery
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier queue
//! - HTTP fetching, gzip inflation and charset resolution
//! - Link extraction
//! - Listener hooks for pages, discovered links and errors
//! - The worker pool that ties them together

mod coordinator;
mod events;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::Crawler;
pub use events::{CrawlListener, DiscoveredLink, FetchedPage, NoopListener, SinkListener};
pub use fetcher::{
    build_http_client, charset_from_content_type, decode_body, fetch_page, inflate_gzip,
    sniff_meta_charset, FetchError, FetchedResponse,
};
pub use frontier::{FrontierQueue, UrlWorkItem};
pub use parser::{extract_anchors, extract_links, ExtractedLink};

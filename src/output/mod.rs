//! Output module for crawl statistics and summaries
//!
//! This module handles:
//! - Counting pages, failures and link decisions while a crawl runs
//! - Producing the summary returned by a finished crawl
//! - Printing that summary for the command line

pub mod stats;

pub use stats::{print_summary, CrawlStatistics, CrawlSummary};

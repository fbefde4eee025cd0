//! Live crawl counters and the end-of-run summary
//!
//! Workers bump the counters of a shared `CrawlStatistics` as they go; the
//! coordinator turns them into a `CrawlSummary` once every worker has exited.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters shared by all workers of one crawl run
#[derive(Debug, Default)]
pub struct CrawlStatistics {
    pages_fetched: AtomicU64,
    fetch_errors: AtomicU64,
    links_admitted: AtomicU64,
    links_rejected: AtomicU64,
    links_vetoed: AtomicU64,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// A link passed every filter and was enqueued
    pub fn record_admitted(&self) {
        self.links_admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// A link failed one of the built-in filters
    pub fn record_rejected(&self) {
        self.links_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// A link passed the built-in filters but the listener turned it down
    pub fn record_vetoed(&self) {
        self.links_vetoed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched.load(Ordering::Relaxed)
    }

    /// Freezes the counters into a summary
    pub fn snapshot(&self, elapsed: Duration, stopped: bool) -> CrawlSummary {
        CrawlSummary {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            links_admitted: self.links_admitted.load(Ordering::Relaxed),
            links_rejected: self.links_rejected.load(Ordering::Relaxed),
            links_vetoed: self.links_vetoed.load(Ordering::Relaxed),
            elapsed,
            stopped,
        }
    }
}

/// Outcome of a finished crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_fetched: u64,
    pub fetch_errors: u64,
    pub links_admitted: u64,
    pub links_rejected: u64,
    pub links_vetoed: u64,
    pub elapsed: Duration,
    /// True if the run ended through `stop` rather than by running dry
    pub stopped: bool,
}

impl CrawlSummary {
    /// Pages fetched per second over the whole run
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages_fetched as f64 / secs
        } else {
            0.0
        }
    }

    /// Share of fetch attempts that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempts = self.pages_fetched + self.fetch_errors;
        if attempts > 0 {
            (self.pages_fetched as f64 / attempts as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!(
        "Status: {}",
        if summary.stopped { "stopped" } else { "completed" }
    );
    println!("Elapsed: {:.1?}", summary.elapsed);
    println!();

    println!("Pages:");
    println!("  Fetched: {}", summary.pages_fetched);
    println!("  Failed: {}", summary.fetch_errors);
    println!("  Success rate: {:.1}%", summary.success_rate());
    println!("  Throughput: {:.2} pages/sec", summary.pages_per_second());
    println!();

    println!("Links:");
    println!("  Admitted: {}", summary.links_admitted);
    println!("  Rejected by filters: {}", summary.links_rejected);
    println!("  Vetoed by listener: {}", summary.links_vetoed);
}

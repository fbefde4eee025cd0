//! Crawler coordinator - worker pool and per-item pipeline
//!
//! A crawl seeds the frontier, starts one tokio task per configured worker and
//! waits for all of them. Each worker runs the same loop:
//! - Mark itself running and try to dequeue
//! - Fetch and decode the page
//! - Extract links, filter them, ask the listener, enqueue the survivors
//! - Publish the page
//!
//! A worker that finds the frontier empty marks itself idle. When every worker is
//! idle at once the crawl is over; otherwise it rechecks after the idle backoff.

use crate::config::{validate_settings, CrawlSettings};
use crate::crawler::events::{CrawlListener, DiscoveredLink, FetchedPage};
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchError};
use crate::crawler::frontier::{FrontierQueue, UrlWorkItem};
use crate::crawler::parser::extract_links;
use crate::output::{CrawlStatistics, CrawlSummary};
use crate::state::{WorkerState, WorkerStatusTable};
use crate::url::{is_web_url, Admission, LinkPolicy};
use crate::{ConfigError, CrawlError};
use encoding_rs::Encoding;
use parking_lot::Mutex;
use rand::Rng;
use reqwest::cookie::Jar;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Bounds of the randomized politeness delay, in milliseconds
const POLITENESS_DELAY_MS: std::ops::Range<u64> = 1_000..5_000;

/// A multi-worker link crawler
///
/// Construction validates the settings and builds the HTTP client once; the same
/// crawler may then be run repeatedly, one run at a time.
pub struct Crawler {
    settings: Arc<CrawlSettings>,
    policy: Arc<LinkPolicy>,
    fallback_charset: &'static Encoding,
    client: Client,
    cookie_jar: Option<Arc<Jar>>,
    listener: Arc<dyn CrawlListener>,
    running: AtomicBool,
    cancel: Mutex<CancellationToken>,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `settings` - Crawl settings, fixed for the crawler's lifetime
    /// * `listener` - Receives pages, admission requests and errors
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(CrawlError)` - Invalid settings or HTTP client failure
    pub fn new(
        settings: CrawlSettings,
        listener: Arc<dyn CrawlListener>,
    ) -> Result<Self, CrawlError> {
        validate_settings(&settings)?;

        let policy = LinkPolicy::from_settings(&settings)?;
        let fallback_charset = Encoding::for_label(settings.fallback_charset.trim().as_bytes())
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "unknown fallback-charset '{}'",
                    settings.fallback_charset
                ))
            })?;

        let cookie_jar = settings.keep_cookie.then(|| Arc::new(Jar::default()));
        let client = build_http_client(&settings, cookie_jar.clone())?;

        Ok(Self {
            settings: Arc::new(settings),
            policy: Arc::new(policy),
            fallback_charset,
            client,
            cookie_jar,
            listener,
            running: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// The cookie jar shared by all workers, if cookie retention is on
    pub fn cookie_jar(&self) -> Option<&Arc<Jar>> {
        self.cookie_jar.as_ref()
    }

    /// Returns true while a crawl run is in progress
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs a crawl to completion
    ///
    /// Resolves once every worker has exited, either because all of them went idle
    /// or because [`Crawler::stop`] was called.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::AlreadyRunning` if another run is in progress. Per-page
    /// failures never end a run; they are reported through the listener.
    pub async fn crawl(&self) -> Result<CrawlSummary, CrawlError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CrawlError::AlreadyRunning);
        }
        let _running = RunningGuard {
            running: &self.running,
            cancel: &self.cancel,
        };

        // the token is replaced only when a run ends, so a stop issued before this
        // point still reaches the run
        let token = self.cancel.lock().clone();

        let started = Instant::now();
        let worker_count = usize::from(self.settings.threads);
        let run = Arc::new(CrawlRun {
            settings: Arc::clone(&self.settings),
            policy: Arc::clone(&self.policy),
            fallback_charset: self.fallback_charset,
            client: self.client.clone(),
            listener: Arc::clone(&self.listener),
            frontier: FrontierQueue::new(),
            status: WorkerStatusTable::new(worker_count),
            stats: CrawlStatistics::new(),
            token: token.clone(),
        });

        let seeded = run.seed_frontier();
        tracing::info!(
            "Starting crawl with {} seed(s), {} worker(s), depth limit {}",
            seeded,
            worker_count,
            self.settings.depth
        );

        let mut workers = JoinSet::new();
        for index in 0..worker_count {
            workers.spawn(Arc::clone(&run).run_worker(index));
        }

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                // a dead worker can never mark itself idle, so the rest would spin forever
                tracing::error!("Crawl worker failed, stopping run: {}", e);
                token.cancel();
            }
        }

        let summary = run.stats.snapshot(started.elapsed(), token.is_cancelled());
        tracing::info!(
            "Crawl finished: {} pages fetched, {} errors, {} links admitted in {:.1?}{}",
            summary.pages_fetched,
            summary.fetch_errors,
            summary.links_admitted,
            summary.elapsed,
            if summary.stopped { " (stopped)" } else { "" }
        );

        Ok(summary)
    }

    /// Stops the current run
    ///
    /// Workers abandon in-flight fetches and sleeps and exit; `crawl` then resolves
    /// with a summary marked as stopped. A stop requested before a run has started
    /// (for example right after spawning `crawl`) ends that run as soon as it begins.
    pub fn stop(&self) {
        if self.is_running() {
            tracing::info!("Stop requested");
        }
        self.cancel.lock().cancel();
    }
}

/// Ends a run, including when its future is dropped
///
/// Arms a fresh cancellation token for the next run, then clears the running flag.
struct RunningGuard<'a> {
    running: &'a AtomicBool,
    cancel: &'a Mutex<CancellationToken>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.cancel.lock() = CancellationToken::new();
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Everything one crawl run shares between its workers
struct CrawlRun {
    settings: Arc<CrawlSettings>,
    policy: Arc<LinkPolicy>,
    fallback_charset: &'static Encoding,
    client: Client,
    listener: Arc<dyn CrawlListener>,
    frontier: FrontierQueue,
    status: WorkerStatusTable,
    stats: CrawlStatistics,
    token: CancellationToken,
}

impl CrawlRun {
    /// Enqueues every well-formed seed at depth 1 and returns how many were kept
    fn seed_frontier(&self) -> usize {
        let mut seeded = 0;
        for seed in &self.settings.seeds {
            if is_web_url(seed) {
                self.frontier.enqueue(UrlWorkItem::new(seed.as_str(), 1));
                seeded += 1;
            } else {
                tracing::debug!("Discarding malformed seed '{}'", seed);
            }
        }
        seeded
    }

    async fn run_worker(self: Arc<Self>, index: usize) {
        tracing::debug!("Worker {} started", index);

        loop {
            if self.token.is_cancelled() {
                break;
            }

            // running must be visible before the dequeue so a worker holding an
            // item is never counted as idle
            self.status.set(index, WorkerState::Running);

            match self.frontier.dequeue() {
                Some(item) => {
                    if !self.process(item).await {
                        break;
                    }
                }
                None => {
                    self.status.set(index, WorkerState::Idle);
                    if self.status.all_idle() {
                        break;
                    }

                    tokio::select! {
                        _ = self.token.cancelled() => break,
                        _ = tokio::time::sleep(self.settings.idle_backoff()) => {}
                    }
                }
            }
        }

        self.status.set(index, WorkerState::Idle);
        tracing::debug!("Worker {} exited", index);
    }

    /// Runs one work item through the pipeline
    ///
    /// Returns false if the run was cancelled while the item was in flight.
    async fn process(&self, item: UrlWorkItem) -> bool {
        if self.settings.auto_speed_limit {
            let delay = politeness_delay();
            tokio::select! {
                _ = self.token.cancelled() => return false,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::debug!("Fetching {} (depth {})", item.url, item.depth);

        let fetched = tokio::select! {
            _ = self.token.cancelled() => Err(FetchError::Cancelled { url: item.url.clone() }),
            result = fetch_page(&self.client, &item.url) => result,
        };

        let decoded = fetched.and_then(|response| {
            let response_url = response.response_url.clone();
            response
                .into_text(self.fallback_charset)
                .map(|html| (response_url, html))
        });

        let (response_url, html) = match decoded {
            Ok(page) => page,
            Err(e) if e.is_cancelled() => return false,
            Err(e) => {
                self.stats.record_fetch_error();
                tracing::debug!("{}", e);
                self.listener.on_error(&item.url, &e);
                return true;
            }
        };

        self.stats.record_page();

        if self.settings.is_depth_limited() && item.depth >= self.settings.depth {
            tracing::trace!("Depth limit reached at {}, not expanding", item.url);
        } else {
            self.expand(&item, &response_url, &html);
        }

        self.listener.on_page_fetched(&FetchedPage {
            url: &item.url,
            depth: item.depth,
            html: &html,
        });

        true
    }

    /// Extracts, filters and enqueues the links of a fetched page
    ///
    /// Relative links resolve against the final response URL; the host lock is
    /// judged against the URL that was requested.
    fn expand(&self, item: &UrlWorkItem, response_url: &Url, html: &str) {
        let page_url = Url::parse(&item.url).unwrap_or_else(|_| response_url.clone());

        for link in extract_links(html, response_url) {
            if let Admission::Rejected(reason) = self.policy.check(&link.url, &page_url) {
                self.stats.record_rejected();
                tracing::trace!("Rejected {} ({:?})", link.url, reason);
                continue;
            }

            let child = item.child(link.url.as_str());
            let admitted = self.listener.on_link_discovered(&DiscoveredLink {
                url: &child.url,
                depth: child.depth,
                anchor_text: &link.anchor_text,
            });

            if admitted {
                self.stats.record_admitted();
                self.frontier.enqueue(child);
            } else {
                self.stats.record_vetoed();
            }
        }
    }
}

fn politeness_delay() -> Duration {
    Duration::from_millis(rand::rng().random_range(POLITENESS_DELAY_MS))
}

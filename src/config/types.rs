use serde::Deserialize;
use std::time::Duration;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.11 (KHTML, like Gecko) Chrome/23.0.1271.97 Safari/537.11";

/// Main configuration structure for Link-Ripple
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Per-run crawl settings
///
/// Read-only once a crawl starts; the crawler keeps its own shared copy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlSettings {
    /// Number of concurrent workers
    pub threads: u16,

    /// Maximum link depth to expand (0 = unbounded); seeds are depth 1
    pub depth: u32,

    /// Only follow links on the seed's registrable domain
    pub lock_host: bool,

    /// Links ending in one of these suffixes are never followed (case-insensitive)
    pub escape_suffixes: Vec<String>,

    /// If non-empty, links must contain at least one of these keywords
    pub href_keywords: Vec<String>,

    /// If non-empty, links must match at least one of these regular expressions
    pub allow_patterns: Vec<String>,

    /// User-Agent header value
    pub user_agent: String,

    /// Per-request timeout in milliseconds (0 = no timeout)
    pub timeout_ms: u64,

    /// Share one cookie jar across all workers
    pub keep_cookie: bool,

    /// Sleep a random 1-5 seconds before each fetch
    pub auto_speed_limit: bool,

    /// Delay before an idle worker rechecks the frontier (milliseconds)
    pub idle_backoff_ms: u64,

    /// Codepage used when neither the page nor the server declares a charset
    pub fallback_charset: String,

    /// Seed URLs; anything that does not look like an http(s) URL is dropped
    pub seeds: Vec<String>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            threads: 1,
            depth: 3,
            lock_host: true,
            escape_suffixes: Vec::new(),
            href_keywords: Vec::new(),
            allow_patterns: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 15_000,
            keep_cookie: true,
            auto_speed_limit: false,
            idle_backoff_ms: 2_000,
            fallback_charset: "windows-1252".to_string(),
            seeds: Vec::new(),
        }
    }
}

impl CrawlSettings {
    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Idle recheck delay
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    /// Returns true if link expansion stops at a fixed depth
    pub fn is_depth_limited(&self) -> bool {
        self.depth > 0
    }
}

/// Where accepted links are recorded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// One URL per line on standard output
    #[default]
    Stdout,
    /// Appended to a text file, one URL per line
    File,
    /// Appended to a SQLite table
    Sqlite,
    /// Kept in memory only
    Memory,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Sink backend
    pub sink: SinkKind,

    /// Output path for the file and sqlite sinks
    pub path: Option<String>,

    /// Hard cap on the number of links the sink will record
    pub max_links: u64,

    /// Target false-positive rate of the sink's membership filter (0 = auto)
    pub error_rate: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::Stdout,
            path: None,
            max_links: 200_000,
            error_rate: 0.0,
        }
    }
}

impl OutputConfig {
    /// Configured error rate, or `None` to let the filter choose
    pub fn filter_error_rate(&self) -> Option<f64> {
        (self.error_rate > 0.0).then_some(self.error_rate)
    }
}

//! Link-Ripple main entry point
//!
//! This is the command-line interface for the Link-Ripple crawler.

use anyhow::Context;
use clap::Parser;
use link_ripple::config::{load_config_with_hash, validate, Config, SinkKind};
use link_ripple::crawler::{CrawlListener, Crawler, SinkListener};
use link_ripple::output::print_summary;
use link_ripple::storage::{open_sink, LinkSink};
use link_ripple::url::is_web_url;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Link-Ripple: a bounded multi-worker link crawler
///
/// Link-Ripple fetches the seed pages, follows the links that pass its filters up
/// to the configured depth, and records every distinct link it admits.
#[derive(Parser, Debug)]
#[command(name = "link-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A bounded multi-worker link crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL, in addition to the configured seeds (repeatable)
    #[arg(short, long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Number of crawl workers
    #[arg(short, long)]
    threads: Option<u16>,

    /// Maximum crawl depth (0 = unbounded)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration after command-line overrides")?;

    if config.crawler.seeds.is_empty() {
        anyhow::bail!("no seed URLs: pass --url or list seeds in the configuration file");
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("link_ripple=info,warn"),
            1 => EnvFilter::new("link_ripple=debug,info"),
            2 => EnvFilter::new("link_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // links may be going to stdout, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    config.crawler.seeds.extend(cli.urls.iter().cloned());

    if let Some(threads) = cli.threads {
        config.crawler.threads = threads;
    }

    if let Some(depth) = cli.depth {
        config.crawler.depth = depth;
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let sink_kind = config.output.sink;
    let store = Arc::new(open_sink(&config.output).context("failed to open link sink")?);

    // seeds count as known links, so pages linking back to them do not refetch them
    for seed in config.crawler.seeds.iter().filter(|seed| is_web_url(seed)) {
        store.try_add(seed);
    }

    tracing::info!(
        "Crawling {} seed(s) with {} worker(s), recording links to {:?}",
        config.crawler.seeds.len(),
        config.crawler.threads,
        sink_kind
    );

    let listener: Arc<dyn CrawlListener> = Arc::new(SinkListener::new(Arc::clone(&store)));
    let crawler = Arc::new(Crawler::new(config.crawler, listener)?);

    let stopper = Arc::clone(&crawler);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.stop();
        }
    });

    let summary = match crawler.crawl().await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    store.flush().context("failed to flush link sink")?;
    tracing::info!(
        "Recorded {} links, membership filter {:.2}% saturated",
        store.len(),
        store.saturation() * 100.0
    );

    if sink_kind != SinkKind::Stdout {
        print_summary(&summary);
    }

    Ok(())
}

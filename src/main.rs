//! Linden command-line entry point

use anyhow::Context;
use clap::Parser;
use linden::config::{CrawlConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_DEPTH};
use linden::crawler::run_crawl;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Linden: a bounded, depth-limited web crawler
///
/// Starting from a seed URL, linden fetches pages, extracts their links,
/// and follows them breadth-first up to the configured depth, visiting
/// each normalized URL at most once.
#[derive(Parser, Debug)]
#[command(name = "linden")]
#[command(version)]
#[command(about = "A bounded, depth-limited web crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum traversal depth for discovered links
    #[arg(short, long, default_value_t = DEFAULT_MAX_DEPTH)]
    depth: u32,

    /// Number of concurrent workers
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Increase logging verbosity (-v, -vv)
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

    let seed = Url::parse(&cli.url)
        .with_context(|| format!("invalid seed URL: {}", cli.url))?;

    let config = CrawlConfig {
        seed,
        max_depth: cli.depth,
        concurrency: cli.concurrency,
    };

    // Per-entry failures inside the crawl are logged, never fatal; only
    // startup failures reach this `?` and exit non-zero.
    let report = run_crawl(config).await.context("crawl failed to start")?;

    println!(
        "Crawled {} pages in {:.2?} ({} fetch failures, {} links discovered, {} admitted)",
        report.pages_fetched,
        report.elapsed,
        report.fetch_failures,
        report.links_discovered,
        report.urls_admitted
    );

    Ok(())
}

/// Sets up the tracing subscriber; RUST_LOG takes precedence over flags
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        env_filter
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linden=info,warn"),
            1 => EnvFilter::new("linden=debug,info"),
            2 => EnvFilter::new("linden=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

//! Linden: a bounded, depth-limited web crawler
//!
//! Given a seed URL and a maximum traversal depth, linden discovers the
//! outbound links reachable from that seed, never visiting the same
//! normalized URL twice and never exceeding the configured depth.

pub mod config;
pub mod crawler;
pub mod url;

use thiserror::Error;

/// Main error type for linden operations
///
/// Only startup failures cross the crawl boundary; everything discovered
/// during the crawl loop (fetch failures, rejected admissions, malformed
/// pages) is contained per entry and never surfaces here.
#[derive(Debug, Error)]
pub enum LindenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid seed URL: {0}")]
    InvalidSeed(#[from] UrlError),

    #[error("Failed to fetch seed page: {0}")]
    SeedFetch(#[from] crawler::FetchError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for linden operations
pub type Result<T> = std::result::Result<T, LindenError>;

// Re-export commonly used types
pub use crate::config::CrawlConfig;
pub use crate::crawler::{run_crawl, CrawlReport};
pub use crate::url::normalize_url;

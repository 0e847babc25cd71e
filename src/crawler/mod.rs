//! Crawl engine
//!
//! The queue and scheduler form the core: exactly-once admission of
//! discovered URLs, a fixed-size worker pool, and termination detection
//! that waits for both an empty queue and zero in-flight entries. The
//! fetcher and parser are thin collaborators around reqwest and scraper.

mod fetcher;
mod parser;
mod queue;
mod scheduler;

pub use fetcher::{build_http_client, fetch_page, FetchError};
pub use parser::extract_links;
pub use queue::{Admission, CrawlQueue, QueueEntry, RejectReason};
pub use scheduler::{run_crawl, CrawlReport, Scheduler};

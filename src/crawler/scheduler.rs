//! Worker pool and crawl orchestration
//!
//! The scheduler runs the crawl end to end: it fetches the seed page once,
//! admits the seed's links as depth-0 entries, then spawns a fixed-size
//! pool of workers that drain the queue to quiescence. Each worker loops
//! take → fetch → extract → admit children, so the only coordination point
//! is the queue itself.
//!
//! Error containment follows a strict boundary: only the seed step can fail
//! the run. Everything after it — fetch failures, unparsable pages,
//! rejected admissions — is absorbed per entry and at most logged.

use crate::config::CrawlConfig;
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::parser::extract_links;
use crate::crawler::queue::{Admission, CrawlQueue, QueueEntry};
use crate::url::normalize_url;
use crate::LindenError;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Summary of a completed crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Pages fetched successfully, the seed included
    pub pages_fetched: usize,

    /// Entries abandoned because their fetch failed
    pub fetch_failures: usize,

    /// Raw links discovered across all fetched pages (before dedup)
    pub links_discovered: usize,

    /// Links that passed the admission gate
    pub urls_admitted: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Shared run counters, updated by all workers
#[derive(Default)]
struct CrawlStats {
    pages_fetched: AtomicUsize,
    fetch_failures: AtomicUsize,
    links_discovered: AtomicUsize,
    urls_admitted: AtomicUsize,
}

/// Runs `concurrency` workers over one shared [`CrawlQueue`]
pub struct Scheduler {
    config: CrawlConfig,
    client: Client,
    queue: Arc<CrawlQueue>,
    stats: Arc<CrawlStats>,
}

impl Scheduler {
    pub fn new(config: CrawlConfig, client: Client) -> Self {
        let queue = Arc::new(CrawlQueue::new(config.max_depth));
        Self {
            config,
            client,
            queue,
            stats: Arc::new(CrawlStats::default()),
        }
    }

    /// Runs the crawl to quiescence
    ///
    /// The seed step happens outside the pool: the seed page itself is never
    /// depth-checked or dedup-checked, only its discovered children are. A
    /// seed that cannot be normalized or fetched fails the whole run.
    pub async fn run(self) -> Result<CrawlReport, LindenError> {
        let start = Instant::now();

        tracing::info!(
            seed = %self.config.seed,
            max_depth = self.config.max_depth,
            concurrency = self.config.concurrency,
            "starting crawl"
        );

        self.seed().await?;

        let mut handles = Vec::with_capacity(self.config.concurrency);
        for worker_id in 0..self.config.concurrency {
            let queue = self.queue.clone();
            let client = self.client.clone();
            let stats = self.stats.clone();
            handles.push(tokio::spawn(async move {
                worker(worker_id, queue, client, stats).await;
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("worker task failed: {}", e);
            }
        }

        let report = CrawlReport {
            pages_fetched: self.stats.pages_fetched.load(Ordering::Relaxed),
            fetch_failures: self.stats.fetch_failures.load(Ordering::Relaxed),
            links_discovered: self.stats.links_discovered.load(Ordering::Relaxed),
            urls_admitted: self.stats.urls_admitted.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
        };

        tracing::info!(
            pages = report.pages_fetched,
            failures = report.fetch_failures,
            admitted = report.urls_admitted,
            "crawl completed in {:?}",
            report.elapsed
        );

        Ok(report)
    }

    /// Fetches the seed page and admits its links at depth 0
    async fn seed(&self) -> Result<(), LindenError> {
        let seed = normalize_url(&self.config.seed)?;

        // Marked before fetching so pages linking back to the seed are
        // rejected as already visited.
        self.queue.mark_visited(&seed);

        let body = fetch_page(&self.client, &seed).await?;
        self.stats.pages_fetched.fetch_add(1, Ordering::Relaxed);

        let links = extract_links(&body, &seed);
        tracing::debug!(count = links.len(), "seed page links extracted");
        self.stats
            .links_discovered
            .fetch_add(links.len(), Ordering::Relaxed);

        for link in links {
            match self.queue.try_admit(QueueEntry::new(link, 0)) {
                Admission::Accepted => {
                    self.stats.urls_admitted.fetch_add(1, Ordering::Relaxed);
                }
                Admission::Rejected(reason) => {
                    tracing::trace!(?reason, "seed link not admitted");
                }
            }
        }

        // With max_depth = 0 (or a linkless seed) nothing was enqueued and
        // the pool must observe quiescence immediately.
        self.queue.check_quiescence();

        Ok(())
    }
}

/// One worker: drain the queue until the pool is quiescent
async fn worker(worker_id: usize, queue: Arc<CrawlQueue>, client: Client, stats: Arc<CrawlStats>) {
    while let Some(entry) = queue.take().await {
        process_entry(&queue, &client, &stats, &entry).await;
        // The entry is done whether its fetch succeeded or not; this is
        // what lets blocked siblings detect quiescence.
        queue.task_done();
    }
    tracing::debug!(worker_id, "worker stopped at quiescence");
}

/// Processes one taken entry: fetch, extract, admit children
async fn process_entry(
    queue: &CrawlQueue,
    client: &Client,
    stats: &CrawlStats,
    entry: &QueueEntry,
) {
    tracing::debug!(url = %entry.url, depth = entry.depth, "processing");

    let body = match fetch_page(client, &entry.url).await {
        Ok(body) => body,
        Err(e) => {
            // Abandon the entry; no retry within the run.
            tracing::warn!(url = %entry.url, "fetch failed: {}", e);
            stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };
    stats.pages_fetched.fetch_add(1, Ordering::Relaxed);

    let links = extract_links(&body, &entry.url);
    stats
        .links_discovered
        .fetch_add(links.len(), Ordering::Relaxed);

    for link in links {
        match queue.try_admit(entry.child(link)) {
            Admission::Accepted => {
                stats.urls_admitted.fetch_add(1, Ordering::Relaxed);
            }
            Admission::Rejected(reason) => {
                tracing::trace!(?reason, "link not admitted");
            }
        }
    }
}

/// Runs a complete crawl with the given configuration
///
/// Validates the configuration, builds the HTTP client, and drives the
/// scheduler to quiescence. Only startup failures (bad configuration,
/// client build failure, unreachable seed) surface as errors.
pub async fn run_crawl(config: CrawlConfig) -> Result<CrawlReport, LindenError> {
    config.validate()?;
    let client = build_http_client()?;
    Scheduler::new(config, client).run().await
}

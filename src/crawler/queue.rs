//! Crawl queue and visited-URL ledger
//!
//! This is the single piece of shared mutable state in a crawl run: a FIFO
//! queue of pending `(url, depth)` entries, the set of normalized URLs that
//! have ever been admitted, and a pending-work counter used for termination
//! detection.
//!
//! Admission is one atomic step under one lock: depth check, normalization,
//! duplicate check, mark-visited, enqueue. Marking a URL visited at
//! admission time (not after its fetch completes) is what makes the
//! per-URL "will be fetched" decision exactly-once: two workers that
//! discover the same URL concurrently cannot both get it past the gate,
//! no matter how long the eventual fetch takes. The trade-off is that a
//! URL whose fetch later fails is never retried within the run.
//!
//! Termination: queue-empty alone is not a valid stop signal, because a
//! worker may be mid-fetch and about to enqueue children after every other
//! worker has seen an empty queue. `take` therefore increments an in-flight
//! counter and `task_done` decrements it; only when the queue is empty AND
//! the counter is zero is the run quiescent, at which point the internal
//! semaphore is closed and every blocked or future `take` returns `None`.

use crate::url::normalize_url;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::Semaphore;
use url::Url;

/// A unit of pending work: a URL and its link-hop distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub url: Url,
    pub depth: u32,
}

impl QueueEntry {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }

    /// A child entry one hop deeper, for a link discovered on this page
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth + 1,
        }
    }
}

/// Why an entry was turned away at the admission gate
///
/// Rejections are expected control flow, not failures: the scheduler
/// absorbs them silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The entry's depth is at or past the configured maximum
    MaxDepthExceeded,
    /// The URL failed normalization (bad scheme, no host, ...)
    InvalidUrl,
    /// The same normalized URL is already waiting in the queue
    AlreadyEnqueued,
    /// The same normalized URL was already taken by a worker earlier in the run
    AlreadyVisited,
}

/// Outcome of the atomic admission step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Rejected(RejectReason),
}

struct QueueState {
    /// FIFO of admitted entries not yet taken by a worker
    pending: VecDeque<QueueEntry>,

    /// Normalized keys currently sitting in `pending`
    queued_keys: HashSet<String>,

    /// Every normalized key ever admitted (or pre-marked). Never shrinks.
    visited: HashSet<String>,

    /// Entries taken but whose processing has not yet completed
    in_flight: usize,
}

/// The shared work queue with its admission gate
pub struct CrawlQueue {
    max_depth: u32,
    state: Mutex<QueueState>,
    /// One permit per pending entry; closed on quiescence to release takers
    available: Semaphore,
}

impl CrawlQueue {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                queued_keys: HashSet::new(),
                visited: HashSet::new(),
                in_flight: 0,
            }),
            available: Semaphore::new(0),
        }
    }

    /// Proposes an entry for crawling
    ///
    /// Checks run in a fixed order, all under one lock so a racing
    /// duplicate of the same URL cannot interleave:
    ///
    /// 1. depth cap (no mutation on reject)
    /// 2. normalization (no mutation on reject)
    /// 3. duplicate still pending in the queue
    /// 4. already visited earlier in the run
    /// 5. mark visited, enqueue the normalized form, release one taker
    pub fn try_admit(&self, entry: QueueEntry) -> Admission {
        if entry.depth >= self.max_depth {
            return Admission::Rejected(RejectReason::MaxDepthExceeded);
        }

        let normalized = match normalize_url(&entry.url) {
            Ok(url) => url,
            Err(_) => return Admission::Rejected(RejectReason::InvalidUrl),
        };

        let key = normalized.to_string();
        let mut state = self.state.lock().unwrap();

        if state.queued_keys.contains(&key) {
            return Admission::Rejected(RejectReason::AlreadyEnqueued);
        }
        if state.visited.contains(&key) {
            return Admission::Rejected(RejectReason::AlreadyVisited);
        }

        state.visited.insert(key.clone());
        state.queued_keys.insert(key);
        state.pending.push_back(QueueEntry::new(normalized, entry.depth));
        self.available.add_permits(1);

        Admission::Accepted
    }

    /// Takes the next entry, suspending while the queue is empty but work
    /// is still in flight
    ///
    /// Returns `None` once the run is quiescent: nothing pending and no
    /// worker mid-entry. Taking an entry counts it as in-flight until the
    /// matching [`task_done`](Self::task_done).
    pub async fn take(&self) -> Option<QueueEntry> {
        let permit = match self.available.acquire().await {
            Ok(permit) => permit,
            // Closed semaphore means quiescence was detected.
            Err(_) => return None,
        };
        permit.forget();

        let mut state = self.state.lock().unwrap();
        // One permit was added per pushed entry, so the queue is non-empty.
        let entry = state.pending.pop_front()?;
        state.queued_keys.remove(entry.url.as_str());
        state.in_flight += 1;
        Some(entry)
    }

    /// Marks a previously taken entry as fully processed
    ///
    /// Must be called exactly once per successful `take`, whether the fetch
    /// succeeded or not, after all of the entry's children were offered to
    /// the gate.
    pub fn task_done(&self) {
        let mut state = self.state.lock().unwrap();
        debug_assert!(state.in_flight > 0, "task_done without a matching take");
        state.in_flight = state.in_flight.saturating_sub(1);
        self.close_if_quiescent(&state);
    }

    /// Closes the queue if no further work can ever arrive
    ///
    /// Called after the seed step in case the seed produced no admissible
    /// children at all; `task_done` performs the same check internally.
    pub fn check_quiescence(&self) {
        let state = self.state.lock().unwrap();
        self.close_if_quiescent(&state);
    }

    fn close_if_quiescent(&self, state: &QueueState) {
        if state.in_flight == 0 && state.pending.is_empty() {
            self.available.close();
        }
    }

    /// Pre-marks a normalized URL as visited without enqueuing it
    ///
    /// Used for the seed page, which is fetched outside the pool and must
    /// reject self-links as `AlreadyVisited`.
    pub fn mark_visited(&self, normalized: &Url) {
        let mut state = self.state.lock().unwrap();
        state.visited.insert(normalized.to_string());
    }

    /// Number of entries waiting to be taken
    pub fn pending_len(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    /// Number of distinct normalized URLs admitted or pre-marked so far
    pub fn visited_len(&self) -> usize {
        self.state.lock().unwrap().visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn entry(s: &str, depth: u32) -> QueueEntry {
        QueueEntry::new(Url::parse(s).unwrap(), depth)
    }

    #[test]
    fn test_admit_accepts_fresh_url() {
        let queue = CrawlQueue::new(3);
        assert_eq!(
            queue.try_admit(entry("https://a.test/x", 0)),
            Admission::Accepted
        );
        assert_eq!(queue.pending_len(), 1);
        assert_eq!(queue.visited_len(), 1);
    }

    #[test]
    fn test_admit_rejects_at_max_depth() {
        let queue = CrawlQueue::new(2);
        assert_eq!(
            queue.try_admit(entry("https://a.test/x", 2)),
            Admission::Rejected(RejectReason::MaxDepthExceeded)
        );
        // No mutation on reject.
        assert_eq!(queue.pending_len(), 0);
        assert_eq!(queue.visited_len(), 0);
    }

    #[test]
    fn test_admit_rejects_past_max_depth() {
        let queue = CrawlQueue::new(2);
        assert_eq!(
            queue.try_admit(entry("https://a.test/x", 5)),
            Admission::Rejected(RejectReason::MaxDepthExceeded)
        );
    }

    #[test]
    fn test_depth_zero_rejects_everything() {
        let queue = CrawlQueue::new(0);
        assert_eq!(
            queue.try_admit(entry("https://a.test/x", 0)),
            Admission::Rejected(RejectReason::MaxDepthExceeded)
        );
    }

    #[test]
    fn test_admit_rejects_invalid_scheme() {
        let queue = CrawlQueue::new(3);
        assert_eq!(
            queue.try_admit(entry("ftp://a.test/file", 0)),
            Admission::Rejected(RejectReason::InvalidUrl)
        );
        assert_eq!(queue.visited_len(), 0);
    }

    #[test]
    fn test_duplicate_pending_is_already_enqueued() {
        let queue = CrawlQueue::new(3);
        assert_eq!(queue.try_admit(entry("https://a.test/x", 0)), Admission::Accepted);
        assert_eq!(
            queue.try_admit(entry("https://a.test/x", 1)),
            Admission::Rejected(RejectReason::AlreadyEnqueued)
        );
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn test_fragment_variants_collide() {
        let queue = CrawlQueue::new(3);
        assert_eq!(queue.try_admit(entry("https://a.test/x", 0)), Admission::Accepted);
        assert_eq!(
            queue.try_admit(entry("https://a.test/x#frag", 0)),
            Admission::Rejected(RejectReason::AlreadyEnqueued)
        );
    }

    #[tokio::test]
    async fn test_taken_duplicate_is_already_visited() {
        let queue = CrawlQueue::new(3);
        queue.try_admit(entry("https://a.test/x", 0));
        let taken = queue.take().await.unwrap();
        assert_eq!(taken.url.as_str(), "https://a.test/x");
        assert_eq!(
            queue.try_admit(entry("https://a.test/x", 1)),
            Admission::Rejected(RejectReason::AlreadyVisited)
        );
    }

    #[test]
    fn test_mark_visited_blocks_self_link() {
        let queue = CrawlQueue::new(3);
        let seed = Url::parse("https://a.test/").unwrap();
        queue.mark_visited(&seed);
        assert_eq!(
            queue.try_admit(entry("https://a.test/", 0)),
            Admission::Rejected(RejectReason::AlreadyVisited)
        );
    }

    #[test]
    fn test_entry_stored_in_normalized_form() {
        let queue = CrawlQueue::new(3);
        queue.try_admit(entry("https://WWW.A.test/page/#x", 0));
        let state = queue.state.lock().unwrap();
        assert_eq!(state.pending[0].url.as_str(), "https://a.test/page");
    }

    #[tokio::test]
    async fn test_take_is_fifo() {
        let queue = CrawlQueue::new(3);
        queue.try_admit(entry("https://a.test/1", 0));
        queue.try_admit(entry("https://a.test/2", 0));
        assert_eq!(queue.take().await.unwrap().url.as_str(), "https://a.test/1");
        assert_eq!(queue.take().await.unwrap().url.as_str(), "https://a.test/2");
    }

    #[tokio::test]
    async fn test_empty_idle_queue_returns_none_after_check() {
        let queue = CrawlQueue::new(3);
        queue.check_quiescence();
        assert!(queue.take().await.is_none());
    }

    #[tokio::test]
    async fn test_take_blocks_while_work_in_flight() {
        let queue = Arc::new(CrawlQueue::new(3));
        queue.try_admit(entry("https://a.test/1", 0));
        let first = queue.take().await.unwrap();

        // Queue is now empty but `first` is in flight: a second take must
        // suspend rather than observe premature quiescence.
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.take().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished(), "take returned while work was in flight");

        // The in-flight entry produces a child, then completes.
        assert_eq!(
            queue.try_admit(first.child(Url::parse("https://a.test/2").unwrap())),
            Admission::Accepted
        );
        queue.task_done();

        let second = waiter.await.unwrap().unwrap();
        assert_eq!(second.url.as_str(), "https://a.test/2");
        assert_eq!(second.depth, 1);
    }

    #[tokio::test]
    async fn test_quiescence_releases_all_blocked_takers() {
        let queue = Arc::new(CrawlQueue::new(3));
        queue.try_admit(entry("https://a.test/1", 0));
        queue.take().await.unwrap();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move { queue.take().await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Last in-flight entry completes with no children: quiescent.
        queue.task_done();

        for waiter in waiters {
            assert!(waiter.await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_concurrent_admits_accept_exactly_once() {
        let queue = Arc::new(CrawlQueue::new(3));
        let mut handles = Vec::new();
        for depth in 0..2 {
            for _ in 0..8 {
                let queue = queue.clone();
                handles.push(tokio::spawn(async move {
                    queue.try_admit(QueueEntry::new(
                        Url::parse("https://a.test/popular").unwrap(),
                        depth,
                    ))
                }));
            }
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() == Admission::Accepted {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(queue.pending_len(), 1);
    }
}

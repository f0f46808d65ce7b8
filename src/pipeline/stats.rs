//! Pipeline counters.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};

use crate::services::FetchOutcome;

/// Counters shared by the poller and both worker pools.
#[derive(Debug)]
pub struct CrawlStats {
    started_at: DateTime<Utc>,
    cycles: AtomicUsize,
    cycle_failures: AtomicUsize,
    posts_discovered: AtomicUsize,
    posts_enqueued: AtomicUsize,
    posts_done: AtomicUsize,
    post_snapshots_saved: AtomicUsize,
    comments_enqueued: AtomicUsize,
    comments_done: AtomicUsize,
    comment_pages_saved: AtomicUsize,
    fetch_skipped: AtomicUsize,
    fetch_failed: AtomicUsize,
    storage_errors: AtomicUsize,
}

/// Point-in-time copy of [`CrawlStats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub cycles: usize,
    pub cycle_failures: usize,
    pub posts_discovered: usize,
    pub posts_enqueued: usize,
    pub posts_done: usize,
    pub post_snapshots_saved: usize,
    pub comments_enqueued: usize,
    pub comments_done: usize,
    pub comment_pages_saved: usize,
    pub fetch_skipped: usize,
    pub fetch_failed: usize,
    pub storage_errors: usize,
}

fn bump(counter: &AtomicUsize, by: usize) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            cycles: AtomicUsize::new(0),
            cycle_failures: AtomicUsize::new(0),
            posts_discovered: AtomicUsize::new(0),
            posts_enqueued: AtomicUsize::new(0),
            posts_done: AtomicUsize::new(0),
            post_snapshots_saved: AtomicUsize::new(0),
            comments_enqueued: AtomicUsize::new(0),
            comments_done: AtomicUsize::new(0),
            comment_pages_saved: AtomicUsize::new(0),
            fetch_skipped: AtomicUsize::new(0),
            fetch_failed: AtomicUsize::new(0),
            storage_errors: AtomicUsize::new(0),
        }
    }

    pub fn cycle_finished(&self, failed: bool) {
        bump(&self.cycles, 1);
        if failed {
            bump(&self.cycle_failures, 1);
        }
    }

    pub fn posts_discovered(&self, count: usize) {
        bump(&self.posts_discovered, count);
    }

    pub fn post_enqueued(&self) {
        bump(&self.posts_enqueued, 1);
    }

    pub fn post_done(&self) {
        bump(&self.posts_done, 1);
    }

    pub fn post_snapshot_saved(&self) {
        bump(&self.post_snapshots_saved, 1);
    }

    pub fn comment_enqueued(&self) {
        bump(&self.comments_enqueued, 1);
    }

    pub fn comment_done(&self) {
        bump(&self.comments_done, 1);
    }

    pub fn comment_page_saved(&self) {
        bump(&self.comment_pages_saved, 1);
    }

    pub fn storage_error(&self) {
        bump(&self.storage_errors, 1);
    }

    /// Count skipped and failed fetches.
    pub fn record_fetch(&self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Skipped => bump(&self.fetch_skipped, 1),
            FetchOutcome::Failed(_) => bump(&self.fetch_failed, 1),
            FetchOutcome::Content(_) => {}
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicUsize| c.load(Ordering::Relaxed);
        StatsSnapshot {
            started_at: self.started_at,
            cycles: load(&self.cycles),
            cycle_failures: load(&self.cycle_failures),
            posts_discovered: load(&self.posts_discovered),
            posts_enqueued: load(&self.posts_enqueued),
            posts_done: load(&self.posts_done),
            post_snapshots_saved: load(&self.post_snapshots_saved),
            comments_enqueued: load(&self.comments_enqueued),
            comments_done: load(&self.comments_done),
            comment_pages_saved: load(&self.comment_pages_saved),
            fetch_skipped: load(&self.fetch_skipped),
            fetch_failed: load(&self.fetch_failed),
            storage_errors: load(&self.storage_errors),
        }
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSnapshot {
    /// Log every counter as a summary block.
    pub fn log_summary(&self, title: &str) {
        let uptime = Utc::now() - self.started_at;
        log::info!("[SUMMARY] {title}");
        log::info!("    uptime: {}s", uptime.num_seconds());
        log::info!("    cycles: {} ({} failed)", self.cycles, self.cycle_failures);
        log::info!(
            "    posts: {} discovered, {} enqueued, {} done, {} saved",
            self.posts_discovered,
            self.posts_enqueued,
            self.posts_done,
            self.post_snapshots_saved
        );
        log::info!(
            "    comment pages: {} enqueued, {} done, {} saved",
            self.comments_enqueued,
            self.comments_done,
            self.comment_pages_saved
        );
        log::info!(
            "    fetches: {} skipped, {} failed; storage errors: {}",
            self.fetch_skipped,
            self.fetch_failed,
            self.storage_errors
        );
    }
}

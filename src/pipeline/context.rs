//! Shared state handed to every pipeline task.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::stats::CrawlStats;
use crate::services::{Fetch, HttpFetcher};
use crate::storage::{LocalStorage, SnapshotStorage};

/// Configuration, collaborators and the shutdown signal.
///
/// Built once at startup and cloned into each task.
#[derive(Clone)]
pub struct CrawlContext {
    pub config: Arc<Config>,
    pub fetcher: Arc<dyn Fetch>,
    pub storage: Arc<dyn SnapshotStorage>,
    pub stats: Arc<CrawlStats>,
    pub in_flight: Arc<InFlight>,
    pub shutdown: CancellationToken,
}

impl CrawlContext {
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<dyn Fetch>,
        storage: Arc<dyn SnapshotStorage>,
    ) -> Self {
        Self {
            config,
            fetcher,
            storage,
            stats: Arc::new(CrawlStats::new()),
            in_flight: Arc::new(InFlight::default()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Context backed by the HTTP fetcher and local filesystem storage.
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        let storage = LocalStorage::new(&config.archive.root_dir);
        Ok(Self::new(
            Arc::new(config),
            Arc::new(fetcher),
            Arc::new(storage),
        ))
    }
}

/// Post folders queued or being processed.
///
/// A folder only appears on disk once its post has been fetched, so a slow
/// post would otherwise pass the existence check again on the next cycle.
#[derive(Debug, Default)]
pub struct InFlight {
    folders: StdMutex<HashSet<PathBuf>>,
}

impl InFlight {
    /// Mark a folder as in flight. Returns `false` if it already was.
    pub fn claim(&self, folder: &Path) -> bool {
        self.folders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(folder.to_path_buf())
    }

    pub fn release(&self, folder: &Path) {
        self.folders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(folder);
    }

    pub fn contains(&self, folder: &Path) -> bool {
        self.folders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(folder)
    }
}

/// Receiving half of a work queue shared by a worker pool.
///
/// Items come out in arrival order; `recv` waits while the queue is empty and
/// returns `None` once every sender is gone and the queue is drained.
pub struct SharedReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for SharedReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedReceiver<T> {
    pub async fn recv(&self) -> Option<T> {
        self.inner.lock().await.recv().await
    }
}

/// Bounded queue: senders wait when `capacity` items are pending.
pub fn work_queue<T>(capacity: usize) -> (mpsc::Sender<T>, SharedReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        tx,
        SharedReceiver {
            inner: Arc::new(Mutex::new(rx)),
        },
    )
}

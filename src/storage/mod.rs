//! Storage abstractions for page snapshots.
//!
//! ## Directory Structure
//!
//! ```text
//! {root}/
//! ├── 38521_Show-HN_-A-tiny-Rust-crawler/
//! │   ├── 38521_Show-HN_-A-tiny-Rust-crawler.html   # post snapshot
//! │   ├── Some-linked-article.html                  # comment page
//! │   └── Another-linked-page.html
//! └── 38522_Ask-HN_-Something/
//!     └── 38522_Ask-HN_-Something.html
//! ```
//!
//! Folder existence is the only dedup index: there is no manifest.

pub mod local;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Whether a post folder has already been created.
    async fn folder_exists(&self, folder: &Path) -> Result<bool>;

    /// Create a folder and its parents if absent.
    async fn ensure_folder(&self, folder: &Path) -> Result<()>;

    /// Replace the whole file at `path` with `content`.
    async fn write_page(&self, path: &Path, content: &str) -> Result<()>;
}

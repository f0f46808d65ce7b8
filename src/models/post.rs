//! Posts, comment page references and page snapshots.

use std::path::{Path, PathBuf};

use crate::utils::filename::sanitize_filename;
use crate::utils::url::extract_thread_id;

/// One row of the front page, before it becomes a [`Post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontPageEntry {
    /// Absolute URL the story links to
    pub target_url: String,

    /// Story title as displayed
    pub title: String,

    /// Absolute URL of the discussion thread
    pub discussion_url: String,
}

/// A front page story scheduled for archiving.
///
/// The folder is derived only from the discussion URL and the title, so the
/// same story always maps to the same folder and folder existence doubles as
/// the dedup index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub target_url: String,
    pub title: String,
    pub discussion_url: String,

    /// Numeric id of the discussion thread
    pub folder_id: String,

    /// `<root>/<folder_id>_<sanitized title>`
    pub folder_path: PathBuf,
}

impl Post {
    /// Build a post rooted at `root`.
    ///
    /// Returns `None` when the discussion URL carries no thread id.
    pub fn new(entry: FrontPageEntry, root: &Path, filename_limit: usize) -> Option<Self> {
        let folder_id = extract_thread_id(&entry.discussion_url)?;
        let folder_name = format!(
            "{}_{}",
            folder_id,
            sanitize_filename(&entry.title, filename_limit)
        );

        Some(Self {
            target_url: entry.target_url,
            title: entry.title,
            discussion_url: entry.discussion_url,
            folder_id,
            folder_path: root.join(folder_name),
        })
    }

    /// Name of the post folder, which is also the post snapshot's stem.
    pub fn folder_name(&self) -> String {
        self.folder_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.folder_id.clone())
    }

    /// Reference to a page linked from this post's discussion.
    pub fn comment_ref(&self, target_url: impl Into<String>) -> CommentPageRef {
        CommentPageRef {
            target_url: target_url.into(),
            parent_folder: self.folder_path.clone(),
        }
    }
}

/// A page linked from a comment, bound to its post's folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPageRef {
    pub target_url: String,
    pub parent_folder: PathBuf,
}

/// Fetched HTML paired with the file stem it will be saved under.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub html: String,
    pub filename: String,
}

impl PageSnapshot {
    pub fn new(html: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            filename: filename.into(),
        }
    }

    /// Path of this snapshot inside `folder`.
    pub fn path_in(&self, folder: &Path, extension: &str) -> PathBuf {
        folder.join(format!("{}.{}", self.filename, extension.trim_start_matches('.')))
    }
}

//! Local filesystem storage implementation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::SnapshotStorage;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Create the archive root.
    pub async fn ensure_root(&self) -> Result<()> {
        self.ensure_folder(&self.root_dir).await
    }

    /// Sibling temp path, unique per write so colliding writers do not
    /// trample each other's partial files.
    fn tmp_path(path: &Path) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
    }
}

#[async_trait]
impl SnapshotStorage for LocalStorage {
    async fn folder_exists(&self, folder: &Path) -> Result<bool> {
        tokio::fs::try_exists(folder)
            .await
            .map_err(|e| AppError::storage(folder, e))
    }

    async fn ensure_folder(&self, folder: &Path) -> Result<()> {
        tokio::fs::create_dir_all(folder)
            .await
            .map_err(|e| AppError::storage(folder, e))
    }

    /// Write to a temp file, then rename over the target (last write wins).
    async fn write_page(&self, path: &Path, content: &str) -> Result<()> {
        let tmp = Self::tmp_path(path);

        let write = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        };

        if let Err(e) = write.await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::storage(path, e));
        }
        Ok(())
    }
}

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GitError;
use crate::git::diff::RawDiff;
use crate::git::types::{BinaryDiff, DiffContent, DiffOption, DiffTarget};
use crate::git::Repository;

/// The git queries a diff classification needs.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Working tree root, used to read the on-disk side of a binary file.
    fn workdir(&self) -> &Path;

    async fn raw_diff(&self, option: &DiffOption) -> Result<RawDiff, GitError>;

    async fn file_size(&self, path: &str, revision: &str) -> Result<u64, GitError>;
}

#[async_trait]
impl DiffSource for Repository {
    fn workdir(&self) -> &Path {
        Repository::workdir(self)
    }

    async fn raw_diff(&self, option: &DiffOption) -> Result<RawDiff, GitError> {
        Repository::raw_diff(self, option).await
    }

    async fn file_size(&self, path: &str, revision: &str) -> Result<u64, GitError> {
        self.query_file_size(path, revision).await
    }
}

/// Decides which kind of diff a file has and builds its payload.
#[derive(Clone)]
pub struct DiffClassifier {
    source: Arc<dyn DiffSource>,
}

impl DiffClassifier {
    pub fn new(source: Arc<dyn DiffSource>) -> Self {
        Self { source }
    }

    /// Binary wins over LFS, LFS over text, and text over no change.
    pub async fn classify(&self, option: &DiffOption) -> Result<DiffContent, GitError> {
        let raw = self.source.raw_diff(option).await?;

        if raw.is_binary {
            return Ok(DiffContent::Binary(self.binary_sizes(option).await));
        }
        if let Some(lfs) = raw.lfs {
            return Ok(DiffContent::Lfs(lfs));
        }
        if let Some(mut text) = raw.text {
            text.file = option.path.clone();
            return Ok(DiffContent::Text(text));
        }
        Ok(DiffContent::NoChange)
    }

    async fn binary_sizes(&self, option: &DiffOption) -> BinaryDiff {
        let old_path = option.old_path();
        match &option.target {
            DiffTarget::Revisions { old, new } => BinaryDiff {
                old_size: self.size_or_zero(old_path, old).await,
                new_size: self.size_or_zero(&option.path, new).await,
            },
            _ => {
                let on_disk = self.source.workdir().join(&option.path);
                let new_size = match tokio::fs::metadata(&on_disk).await {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        log::debug!("no working copy size for {}: {e}", on_disk.display());
                        0
                    }
                };
                BinaryDiff {
                    old_size: self.size_or_zero(old_path, "HEAD").await,
                    new_size,
                }
            }
        }
    }

    async fn size_or_zero(&self, path: &str, revision: &str) -> u64 {
        match self.source.file_size(path, revision).await {
            Ok(size) => size,
            Err(e) => {
                log::debug!("size lookup for {path}@{revision} failed: {e}");
                0
            }
        }
    }
}

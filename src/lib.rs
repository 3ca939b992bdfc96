//! Structured views of a git repository built on the `git` executable:
//! tags, tree objects and classified file diffs.

pub mod async_diff;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod merge_tool;
pub mod state;

use std::path::Path;
use std::sync::Arc;

pub use async_diff::{DiffClassifier, DiffWorker};
pub use error::{ErrorSink, GitError};
pub use git::types::{DiffContent, DiffOption, DiffTarget, ObjectType, RepositoryObject, Tag};
pub use git::{GitCli, Repository};
pub use state::DiffSession;

/// Tags of the repository at `repo_path`, newest first.
pub async fn query_tags(repo_path: &Path) -> Result<Vec<Tag>, GitError> {
    Repository::new(GitCli::new(repo_path)).query_tags().await
}

/// Objects at `revision`, optionally restricted to one folder.
pub async fn query_revision_objects(
    repo_path: &Path,
    revision: &str,
    parent_folder: Option<&str>,
) -> Result<Vec<RepositoryObject>, GitError> {
    Repository::new(GitCli::new(repo_path))
        .query_revision_objects(revision, parent_folder)
        .await
}

/// A worker that classifies diffs for `repository` in the background.
pub fn diff_worker(repository: Repository, errors: Arc<dyn ErrorSink>) -> DiffWorker {
    let repo_path = repository.workdir().to_path_buf();
    DiffWorker::new(repo_path, DiffClassifier::new(Arc::new(repository)), errors)
}

use std::path::{Path, PathBuf};

use super::commands::{args, GitCli};
use super::diff::{query_raw_diff, DiffSettings, RawDiff};
use super::parser::{run_query, FileSizeParser, TagListingParser, TreeListingParser};
use super::types::{DiffOption, RepositoryObject, Tag};
use crate::error::GitError;

/// Read-only queries against one working tree.
#[derive(Debug, Clone)]
pub struct Repository {
    git: GitCli,
    settings: DiffSettings,
}

impl Repository {
    pub fn new(git: GitCli) -> Self {
        Self {
            git,
            settings: DiffSettings::default(),
        }
    }

    /// Resolve the working tree root that contains `path`.
    pub async fn discover(program: impl Into<PathBuf>, path: &Path) -> Result<Self, GitError> {
        let locator = GitCli::with_program(program, path);
        let toplevel = match locator.exec(&args(["rev-parse", "--show-toplevel"])).await {
            Ok(out) => out.trim().to_string(),
            Err(GitError::CommandFailed { .. }) => {
                return Err(GitError::NotARepository(path.to_path_buf()));
            }
            Err(e) => return Err(e),
        };
        if toplevel.is_empty() {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }
        Ok(Self::new(GitCli::with_program(locator.program(), Path::new(&toplevel))))
    }

    pub fn with_settings(mut self, settings: DiffSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn workdir(&self) -> &Path {
        self.git.workdir()
    }

    pub fn git(&self) -> &GitCli {
        &self.git
    }

    pub fn settings(&self) -> &DiffSettings {
        &self.settings
    }

    /// All tags, newest first by creation date.
    pub async fn query_tags(&self) -> Result<Vec<Tag>, GitError> {
        let args = args([
            "tag",
            "-l",
            "--sort=-creatordate",
            "--format=$%(refname)$%(objectname)$%(*objectname)",
        ]);
        run_query(&self.git, &args, TagListingParser::new()).await
    }

    /// Objects directly under `parent_folder` (or the root) at `revision`.
    pub async fn query_revision_objects(
        &self,
        revision: &str,
        parent_folder: Option<&str>,
    ) -> Result<Vec<RepositoryObject>, GitError> {
        let mut args = args(["ls-tree"]);
        args.push(revision.to_string());
        if let Some(folder) = parent_folder.filter(|f| !f.is_empty()) {
            args.push("--".to_string());
            args.push(folder.to_string());
        }
        run_query(&self.git, &args, TreeListingParser::new()).await
    }

    /// Size in bytes of `path` at `revision`; zero when it does not exist there.
    pub async fn query_file_size(&self, path: &str, revision: &str) -> Result<u64, GitError> {
        if is_null_revision(revision) {
            return Ok(0);
        }
        let mut args = args(["ls-tree"]);
        args.push(revision.to_string());
        args.extend(["-l".to_string(), "--".to_string(), path.to_string()]);
        run_query(&self.git, &args, FileSizeParser::new()).await
    }

    pub async fn raw_diff(&self, option: &DiffOption) -> Result<RawDiff, GitError> {
        query_raw_diff(&self.git, option, &self.settings).await
    }
}

/// The all-zero object id git uses for "nothing here".
fn is_null_revision(revision: &str) -> bool {
    !revision.is_empty() && revision.bytes().all(|b| b == b'0')
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::git::types::ObjectType;
    use std::process::Command;

    pub(crate) fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    pub(crate) fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args([
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.com",
                "-c",
                "commit.gpgsign=false",
                "-c",
                "tag.gpgsign=false",
            ])
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(status.status.success(), "git {args:?} failed: {status:?}");
    }

    /// A repository with one commit holding `README.md` and `src/lib.rs`.
    pub(crate) fn fixture_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init", "-q"]);
        std::fs::write(dir.path().join("README.md"), "hello\n").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "pub fn f() {}\n").unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-q", "-m", "init"]);
        dir
    }

    fn head_sha(dir: &Path) -> String {
        let out = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(dir)
            .output()
            .unwrap();
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    #[test]
    fn test_null_revision() {
        assert!(is_null_revision("0000000000000000000000000000000000000000"));
        assert!(!is_null_revision("HEAD"));
        assert!(!is_null_revision(""));
    }

    #[tokio::test]
    async fn test_query_revision_objects() {
        if !git_available() {
            return;
        }
        let dir = fixture_repo();
        let repo = Repository::new(GitCli::new(dir.path()));

        let root = repo.query_revision_objects("HEAD", None).await.unwrap();
        let entries: Vec<_> = root
            .iter()
            .map(|o| (o.object_type, o.path.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![(ObjectType::Blob, "README.md"), (ObjectType::Tree, "src")]
        );

        let again = repo.query_revision_objects("HEAD", None).await.unwrap();
        assert_eq!(root, again);

        let nested = repo
            .query_revision_objects("HEAD", Some("src/"))
            .await
            .unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].path, "src/lib.rs");
    }

    #[tokio::test]
    async fn test_query_revision_objects_bad_revision_fails() {
        if !git_available() {
            return;
        }
        let dir = fixture_repo();
        let repo = Repository::new(GitCli::new(dir.path()));
        let err = repo
            .query_revision_objects("no-such-rev", None)
            .await
            .unwrap_err();
        assert!(err.stderr().is_some());
    }

    #[tokio::test]
    async fn test_query_tags_peels_annotated() {
        if !git_available() {
            return;
        }
        let dir = fixture_repo();
        git(dir.path(), &["tag", "light"]);
        git(dir.path(), &["tag", "-a", "annotated", "-m", "release"]);
        let head = head_sha(dir.path());

        let repo = Repository::new(GitCli::new(dir.path()));
        let mut tags = repo.query_tags().await.unwrap();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "annotated");
        assert_eq!(tags[0].sha, head);
        assert_eq!(tags[1].name, "light");
        assert_eq!(tags[1].sha, head);
    }

    #[tokio::test]
    async fn test_query_file_size() {
        if !git_available() {
            return;
        }
        let dir = fixture_repo();
        let repo = Repository::new(GitCli::new(dir.path()));
        assert_eq!(repo.query_file_size("README.md", "HEAD").await.unwrap(), 6);
        assert_eq!(repo.query_file_size("missing.txt", "HEAD").await.unwrap(), 0);
        assert_eq!(repo.query_file_size("src", "HEAD").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_discover_from_subfolder() {
        if !git_available() {
            return;
        }
        let dir = fixture_repo();
        let repo = Repository::discover("git", &dir.path().join("src"))
            .await
            .unwrap();
        assert_eq!(
            repo.workdir().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );

        let outside = tempfile::tempdir().unwrap();
        let err = Repository::discover("git", outside.path()).await;
        assert!(matches!(err, Err(GitError::NotARepository(_))));
    }
}

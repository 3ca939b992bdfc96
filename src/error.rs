use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised while running git and reading its output.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("git {args} exited with {code}: {stderr}")]
    CommandFailed {
        args: String,
        code: i32,
        stderr: String,
    },
    #[error("failed to read git output: {0}")]
    Io(#[from] io::Error),
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),
}

impl GitError {
    /// Captured standard error, if git got far enough to produce any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// A user-visible error, tagged with the repository it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub context: PathBuf,
    pub message: String,
}

/// Where recoverable, user-facing errors go.
///
/// Passed explicitly to whoever needs to report; there is no process-wide sink.
pub trait ErrorSink: Send + Sync {
    fn raise(&self, context: &Path, message: &str);
}

/// Writes reports to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn raise(&self, context: &Path, message: &str) {
        log::error!("{}: {message}", context.display());
    }
}

impl ErrorSink for mpsc::UnboundedSender<ErrorReport> {
    fn raise(&self, context: &Path, message: &str) {
        let _ = self.send(ErrorReport {
            context: context.to_path_buf(),
            message: message.to_string(),
        });
    }
}

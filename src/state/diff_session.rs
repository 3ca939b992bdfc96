use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::async_diff::SessionUpdate;
use crate::error::ErrorSink;
use crate::git::types::{DiffContent, DiffOption};
use crate::git::GitCli;
use crate::merge_tool::{self, MergeToolConfig, MergeToolError};

/// One file diff as seen by the presentation layer.
///
/// Starts out loading and becomes final once its classification result is
/// applied. While loading it carries the content of the session it replaced.
#[derive(Debug, Clone)]
pub struct DiffSession {
    generation: u64,
    repo_path: PathBuf,
    option: DiffOption,
    is_loading: bool,
    content: Option<Arc<DiffContent>>,
    /// Runtime external tools are launched on.
    runtime: Option<Handle>,
}

impl DiffSession {
    pub fn new(
        generation: u64,
        repo_path: PathBuf,
        option: DiffOption,
        previous: Option<&DiffSession>,
    ) -> Self {
        Self {
            generation,
            repo_path,
            option,
            is_loading: true,
            content: previous.and_then(|p| p.content.clone()),
            runtime: Handle::try_current().ok(),
        }
    }

    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn option(&self) -> &DiffOption {
        &self.option
    }

    pub fn file_path(&self) -> &str {
        &self.option.path
    }

    /// Rename origin worth showing next to the path.
    pub fn orig_file_path(&self) -> Option<&str> {
        self.option.rename_origin()
    }

    pub fn is_unstaged(&self) -> bool {
        self.option.is_unstaged()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn content(&self) -> Option<&DiffContent> {
        self.content.as_deref()
    }

    pub fn is_text_diff(&self) -> bool {
        self.content().is_some_and(DiffContent::is_text)
    }

    pub fn is_no_change(&self) -> bool {
        self.content().is_some_and(DiffContent::is_no_change)
    }

    /// Take this session's own result. Only the first matching update counts.
    pub fn apply(&mut self, update: SessionUpdate) -> bool {
        if update.generation != self.generation || !self.is_loading {
            return false;
        }
        if let Ok(content) = update.content {
            self.content = Some(Arc::new(content));
        }
        self.is_loading = false;
        true
    }

    /// Hand this diff to the configured external comparison tool.
    ///
    /// Misconfiguration is reported on `errors`; the tool itself runs detached
    /// on the session's runtime, so this may be called from any thread.
    pub fn open_with_external_tool(
        &self,
        git: &GitCli,
        tool: Option<&MergeToolConfig>,
        errors: &dyn ErrorSink,
    ) {
        let launched = tool
            .ok_or(MergeToolError::NotConfigured)
            .and_then(|tool| merge_tool::difftool_command(tool, &self.option))
            .and_then(|args| {
                let runtime = self.runtime.as_ref().ok_or(MergeToolError::NoRuntime)?;
                merge_tool::spawn_difftool(runtime, git, args);
                Ok(())
            });
        if let Err(e) = launched {
            errors.raise(&self.repo_path, &e.to_string());
        }
    }
}

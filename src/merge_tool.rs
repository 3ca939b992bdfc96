use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::git::types::DiffOption;
use crate::git::GitCli;

const TOOL_NAME: &str = "revscope";

/// Which external diff tool to use and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeToolConfig {
    pub kind: String,
    pub path: PathBuf,
    /// Argument template, only read for the `custom` kind.
    #[serde(default)]
    pub diff_cmd: String,
}

#[derive(Debug, Error)]
pub enum MergeToolError {
    #[error("invalid merge tool configuration: no tool configured")]
    NotConfigured,
    #[error("invalid merge tool configuration: unknown tool '{0}'")]
    UnknownKind(String),
    #[error("invalid merge tool configuration: {} does not exist", .0.display())]
    MissingExecutable(PathBuf),
    #[error("invalid merge tool configuration: empty diff command")]
    EmptyCommand,
    #[error("invalid merge tool configuration: no async runtime to launch the tool on")]
    NoRuntime,
}

#[derive(Debug, Clone, Copy)]
pub struct ExternalMergeTool {
    pub kind: &'static str,
    pub name: &'static str,
    pub diff_cmd: &'static str,
}

pub const SUPPORTED_TOOLS: &[ExternalMergeTool] = &[
    ExternalMergeTool {
        kind: "custom",
        name: "Custom",
        diff_cmd: "",
    },
    ExternalMergeTool {
        kind: "vscode",
        name: "Visual Studio Code",
        diff_cmd: "-n --wait --diff \"$LOCAL\" \"$REMOTE\"",
    },
    ExternalMergeTool {
        kind: "vscode-insiders",
        name: "Visual Studio Code - Insiders",
        diff_cmd: "-n --wait --diff \"$LOCAL\" \"$REMOTE\"",
    },
    ExternalMergeTool {
        kind: "vscodium",
        name: "VSCodium",
        diff_cmd: "-n --wait --diff \"$LOCAL\" \"$REMOTE\"",
    },
    ExternalMergeTool {
        kind: "meld",
        name: "Meld",
        diff_cmd: "\"$LOCAL\" \"$REMOTE\"",
    },
    ExternalMergeTool {
        kind: "kdiff3",
        name: "KDiff3",
        diff_cmd: "\"$LOCAL\" \"$REMOTE\"",
    },
    ExternalMergeTool {
        kind: "bcompare",
        name: "Beyond Compare",
        diff_cmd: "\"$LOCAL\" \"$REMOTE\"",
    },
    ExternalMergeTool {
        kind: "p4merge",
        name: "P4Merge",
        diff_cmd: "-tw 4 \"$LOCAL\" \"$REMOTE\"",
    },
    ExternalMergeTool {
        kind: "smerge",
        name: "Sublime Merge",
        diff_cmd: "mergetool \"$LOCAL\" \"$REMOTE\"",
    },
];

pub fn find_tool(kind: &str) -> Option<&'static ExternalMergeTool> {
    SUPPORTED_TOOLS.iter().find(|t| t.kind == kind)
}

/// Arguments for `git difftool` running `exec` with `diff_cmd` on one file.
pub fn difftool_args(exec: &Path, diff_cmd: &str, option: &DiffOption) -> Vec<String> {
    let mut args = vec![
        "-c".to_string(),
        format!("difftool.{TOOL_NAME}.cmd=\"{}\" {diff_cmd}", exec.display()),
        "difftool".to_string(),
        format!("--tool={TOOL_NAME}"),
        "--no-prompt".to_string(),
    ];
    args.extend(option.to_args());
    args
}

/// Validate `config` and build the `git difftool` arguments for `option`.
pub fn difftool_command(
    config: &MergeToolConfig,
    option: &DiffOption,
) -> Result<Vec<String>, MergeToolError> {
    let tool = find_tool(&config.kind)
        .ok_or_else(|| MergeToolError::UnknownKind(config.kind.clone()))?;
    if !config.path.is_file() {
        return Err(MergeToolError::MissingExecutable(config.path.clone()));
    }

    let diff_cmd = if tool.kind == "custom" {
        config.diff_cmd.as_str()
    } else {
        tool.diff_cmd
    };
    if diff_cmd.trim().is_empty() {
        return Err(MergeToolError::EmptyCommand);
    }

    log::info!("opening {} for {}", tool.name, option.path);
    Ok(difftool_args(&config.path, diff_cmd, option))
}

/// Run `git difftool` on `runtime` without waiting on it. Safe to call from
/// threads outside the runtime.
pub fn spawn_difftool(runtime: &Handle, git: &GitCli, args: Vec<String>) -> JoinHandle<()> {
    let git = git.clone();
    runtime.spawn(async move {
        if let Err(e) = git
            .exec_lines(&args, |line| log::debug!("difftool: {line}"))
            .await
        {
            log::warn!("external diff tool failed: {e}");
        }
    })
}

/// Validate `config` and launch the tool for `option` without waiting on it.
pub fn open_for_diff(
    runtime: &Handle,
    git: &GitCli,
    config: &MergeToolConfig,
    option: &DiffOption,
) -> Result<JoinHandle<()>, MergeToolError> {
    let args = difftool_command(config, option)?;
    Ok(spawn_difftool(runtime, git, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_tool() {
        assert_eq!(find_tool("meld").map(|t| t.name), Some("Meld"));
        assert!(find_tool("notepad").is_none());
    }

    #[test]
    fn test_difftool_args() {
        let option = DiffOption::between("b.txt", "v1", "v2");
        let args = difftool_args(Path::new("/usr/bin/meld"), "\"$LOCAL\" \"$REMOTE\"", &option);
        assert_eq!(
            args,
            vec![
                "-c",
                "difftool.revscope.cmd=\"/usr/bin/meld\" \"$LOCAL\" \"$REMOTE\"",
                "difftool",
                "--tool=revscope",
                "--no-prompt",
                "v1",
                "v2",
                "--",
                "b.txt",
            ]
        );
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let errors = [
            MergeToolError::NotConfigured,
            MergeToolError::UnknownKind("notepad".into()),
            MergeToolError::MissingExecutable(PathBuf::from("/opt/meld")),
            MergeToolError::EmptyCommand,
            MergeToolError::NoRuntime,
        ];
        for e in errors {
            let message = e.to_string();
            assert!(message.starts_with("invalid merge tool configuration: "));
        }

        let missing = MergeToolError::MissingExecutable(PathBuf::from("/opt/meld"));
        assert_eq!(
            missing.to_string(),
            "invalid merge tool configuration: /opt/meld does not exist"
        );
    }

    #[tokio::test]
    async fn test_open_for_diff_validation() {
        let runtime = Handle::current();
        let git = GitCli::new(&std::env::temp_dir());
        let option = DiffOption::working_copy("a.txt", false);
        let exe = tempfile::NamedTempFile::new().unwrap();

        let unknown = MergeToolConfig {
            kind: "notepad".into(),
            path: exe.path().to_path_buf(),
            diff_cmd: String::new(),
        };
        assert!(matches!(
            open_for_diff(&runtime, &git, &unknown, &option),
            Err(MergeToolError::UnknownKind(_))
        ));

        let custom_without_cmd = MergeToolConfig {
            kind: "custom".into(),
            path: exe.path().to_path_buf(),
            diff_cmd: "  ".into(),
        };
        assert!(matches!(
            open_for_diff(&runtime, &git, &custom_without_cmd, &option),
            Err(MergeToolError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn test_open_for_diff_launches_detached() {
        let dir = tempfile::tempdir().unwrap();
        let exe = tempfile::NamedTempFile::new().unwrap();
        // Stand-in for git that accepts any arguments.
        let git = GitCli::with_program("true", dir.path());
        let config = MergeToolConfig {
            kind: "meld".into(),
            path: exe.path().to_path_buf(),
            diff_cmd: String::new(),
        };

        let option = DiffOption::working_copy("a.txt", false);
        let runtime = Handle::current();
        let handle = open_for_diff(&runtime, &git, &config, &option).unwrap();
        handle.await.unwrap();
    }

    #[test]
    fn test_open_for_diff_from_thread_outside_runtime() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let exe = tempfile::NamedTempFile::new().unwrap();
        let git = GitCli::with_program("true", dir.path());
        let config = MergeToolConfig {
            kind: "meld".into(),
            path: exe.path().to_path_buf(),
            diff_cmd: String::new(),
        };

        let option = DiffOption::working_copy("a.txt", false);
        let handle = open_for_diff(rt.handle(), &git, &config, &option).unwrap();
        rt.block_on(handle).unwrap();
    }
}

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::error::GitError;

/// Runs the git executable inside one working directory.
///
/// Arguments are passed verbatim as an argument vector, never through a shell.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: &Path) -> Self {
        Self::with_program("git", workdir)
    }

    pub fn with_program(program: impl Into<PathBuf>, workdir: &Path) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.to_path_buf(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(&self.workdir)
            // Keep git's messages ("Binary files ... differ") in a parseable language.
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run git and hand every stdout line to `on_line` as soon as it arrives.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped and invalid UTF-8 is
    /// replaced. Stderr is collected on the side and attached to the error
    /// when git exits with a non-zero status.
    pub async fn exec_lines<F>(&self, args: &[String], mut on_line: F) -> Result<(), GitError>
    where
        F: FnMut(&str),
    {
        log::debug!("{} {}", self.program.display(), args.join(" "));

        let mut child = self
            .command(args)
            .spawn()
            .map_err(|source| GitError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        let stderr = child.stderr.take();
        let stderr_handle = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf).await;
            }
            String::from_utf8_lossy(&buf).trim().to_string()
        });

        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).await? == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(trim_eol(&buf));
                on_line(&*line);
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_handle.await.unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        let code = status.code().unwrap_or(-1);
        log::warn!("git {} exited with {code}", args.join(" "));
        Err(GitError::CommandFailed {
            args: args.join(" "),
            code,
            stderr,
        })
    }

    /// Run git and collect its whole stdout.
    pub async fn exec(&self, args: &[String]) -> Result<String, GitError> {
        let mut out = String::new();
        self.exec_lines(args, |line| {
            out.push_str(line);
            out.push('\n');
        })
        .await?;
        Ok(out)
    }
}

fn trim_eol(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

/// Build an owned argument vector from string literals.
pub(crate) fn args<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

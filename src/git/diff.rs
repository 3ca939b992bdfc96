use std::sync::OnceLock;

use regex::Regex;

use super::commands::GitCli;
use super::parser::{run_query, LineParser};
use super::types::*;
use crate::error::GitError;

const LFS_SPEC_PREFIX: &str = "version https://git-lfs.github.com/spec/";

/// Knobs applied to every raw diff invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffSettings {
    pub context_lines: u32,
    /// Treat CRLF vs LF as no change at all.
    pub ignore_cr_at_eol: bool,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            context_lines: 3,
            ignore_cr_at_eol: true,
        }
    }
}

/// Classification hints reported by a raw `git diff` for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDiff {
    pub is_binary: bool,
    /// Pointer metadata when both sides are LFS pointer files.
    pub lfs: Option<LfsDiff>,
    /// `None` when git printed no hunks.
    pub text: Option<TextDiff>,
}

impl RawDiff {
    pub fn is_lfs(&self) -> bool {
        self.lfs.is_some()
    }
}

pub fn raw_diff_args(option: &DiffOption, settings: &DiffSettings) -> Vec<String> {
    let mut args = vec![
        "diff".to_string(),
        "--no-color".to_string(),
        "--no-ext-diff".to_string(),
        "--patch".to_string(),
        format!("--unified={}", settings.context_lines),
    ];
    if settings.ignore_cr_at_eol {
        args.push("--ignore-cr-at-eol".to_string());
    }
    args.extend(option.to_args());
    args
}

pub async fn query_raw_diff(
    git: &GitCli,
    option: &DiffOption,
    settings: &DiffSettings,
) -> Result<RawDiff, GitError> {
    run_query(git, &raw_diff_args(option, settings), RawDiffParser::new()).await
}

/// Parses `git diff --patch` output for a single file.
///
/// A rename git does not pair up shows as two file blocks; their hunks are
/// collected together.
#[derive(Debug, Default)]
pub struct RawDiffParser {
    is_binary: bool,
    hunks: Vec<Hunk>,
    current: Option<Hunk>,
    old_line: u32,
    new_line: u32,
    lfs: Option<LfsDiff>,
}

impl RawDiffParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn hunk_header(line: &str) -> Option<(u32, u32)> {
        static HUNK_HEADER: OnceLock<Regex> = OnceLock::new();
        let re = HUNK_HEADER.get_or_init(|| {
            Regex::new(r"^@@ -(\d+)(?:,\d+)? \+(\d+)(?:,\d+)? @@").expect("valid regex")
        });
        let caps = re.captures(line)?;
        Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
    }

    fn open_hunk(&mut self, line: &str, old_start: u32, new_start: u32) {
        if let Some(h) = self.current.take() {
            self.hunks.push(h);
        }
        self.old_line = old_start;
        self.new_line = new_start;
        self.current = Some(Hunk {
            header: line.to_string(),
            old_start,
            new_start,
            lines: Vec::new(),
        });
    }

    /// Only the very first content line of the first hunk can announce a pointer file.
    fn at_first_content_line(&self) -> bool {
        self.hunks.is_empty() && self.current.as_ref().is_some_and(|h| h.lines.is_empty())
    }

    fn parse_lfs_line(lfs: &mut LfsDiff, line: &str) {
        let mut chars = line.chars();
        let (old, new) = match chars.next() {
            Some('-') => (true, false),
            Some('+') => (false, true),
            Some(' ') => (true, true),
            _ => return,
        };
        let body = chars.as_str();

        if let Some(oid) = body.strip_prefix("oid sha256:") {
            if old {
                lfs.old.oid = oid.to_string();
            }
            if new {
                lfs.new.oid = oid.to_string();
            }
        } else if let Some(size) = body.strip_prefix("size ") {
            let size = size.trim().parse().unwrap_or(0);
            if old {
                lfs.old.size = size;
            }
            if new {
                lfs.new.size = size;
            }
        }
    }

    fn push_line(&mut self, origin: DiffLineOrigin, content: &str) {
        let (old_lineno, new_lineno) = match origin {
            DiffLineOrigin::Addition => {
                self.new_line += 1;
                (None, Some(self.new_line - 1))
            }
            DiffLineOrigin::Deletion => {
                self.old_line += 1;
                (Some(self.old_line - 1), None)
            }
            DiffLineOrigin::Context => {
                self.old_line += 1;
                self.new_line += 1;
                (Some(self.old_line - 1), Some(self.new_line - 1))
            }
        };
        if let Some(h) = self.current.as_mut() {
            h.lines.push(DiffLine {
                origin,
                old_lineno,
                new_lineno,
                content: content.to_string(),
            });
        }
    }
}

impl LineParser for RawDiffParser {
    type Output = RawDiff;

    fn parse_line(&mut self, line: &str) {
        if self.is_binary {
            return;
        }

        if line.starts_with("diff --git ") {
            // Next file: its header lines are not content.
            if let Some(h) = self.current.take() {
                self.hunks.push(h);
            }
            return;
        }

        if self.current.is_none() {
            // Still inside the file header.
            if line.starts_with("Binary files") || line.starts_with("GIT binary patch") {
                self.is_binary = true;
            } else if let Some((old, new)) = Self::hunk_header(line) {
                self.open_hunk(line, old, new);
            }
            return;
        }

        if let Some(lfs) = self.lfs.as_mut() {
            Self::parse_lfs_line(lfs, line);
            return;
        }

        if line.starts_with("@@") {
            if let Some((old, new)) = Self::hunk_header(line) {
                self.open_hunk(line, old, new);
            }
            return;
        }

        let Some(sign) = line.chars().next() else {
            return;
        };
        let content = &line[sign.len_utf8()..];

        if self.at_first_content_line()
            && matches!(sign, '+' | '-')
            && content.starts_with(LFS_SPEC_PREFIX)
        {
            self.lfs = Some(LfsDiff::default());
            return;
        }

        match sign {
            '+' => self.push_line(DiffLineOrigin::Addition, content),
            '-' => self.push_line(DiffLineOrigin::Deletion, content),
            ' ' => self.push_line(DiffLineOrigin::Context, content),
            // "\ No newline at end of file" and anything unexpected.
            _ => {}
        }
    }

    fn finish(mut self) -> Self::Output {
        if let Some(h) = self.current.take() {
            self.hunks.push(h);
        }

        let text = if self.is_binary || self.lfs.is_some() || self.hunks.is_empty() {
            None
        } else {
            Some(TextDiff {
                file: String::new(),
                hunks: self.hunks,
            })
        };

        RawDiff {
            is_binary: self.is_binary,
            lfs: self.lfs,
            text,
        }
    }
}

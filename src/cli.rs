use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use crate::git::types::{DiffOption, DiffTarget};

#[derive(Parser, Debug)]
#[command(
    name = "revscope",
    version,
    about = "Typed views of git tags, tree objects and file diffs"
)]
pub struct Cli {
    /// Repository (or any folder inside it) to inspect
    #[arg(short = 'C', long = "repo", global = true)]
    pub repo: Option<PathBuf>,

    /// git executable to run
    #[arg(long, global = true)]
    pub git: Option<PathBuf>,

    /// Print JSON instead of plain text
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tags, newest first
    Tags,
    /// List the objects of a tree
    Objects {
        /// Revision to list
        revision: String,
        /// Folder inside the tree
        path: Option<String>,
    },
    /// Show the classified diff of one file
    Diff(DiffArgs),
    /// Open one file's diff in the configured external tool
    Difftool(DiffArgs),
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// File to diff
    pub path: String,

    /// Path the file was renamed from
    #[arg(long = "orig")]
    pub orig_path: Option<String>,

    /// Compare the index against HEAD
    #[arg(long, conflicts_with = "revisions")]
    pub staged: bool,

    /// Revision to compare against; give it twice to compare two revisions
    #[arg(long = "rev", value_name = "REV")]
    pub revisions: Vec<String>,

    /// Lines of context around each change
    #[arg(short = 'U', long = "unified")]
    pub context_lines: Option<u32>,
}

impl DiffArgs {
    pub fn to_option(&self) -> Result<DiffOption> {
        let target = match self.revisions.as_slice() {
            [] => DiffTarget::WorkingCopy {
                staged: self.staged,
            },
            [rev] => DiffTarget::Revision(rev.clone()),
            [old, new] => DiffTarget::Revisions {
                old: old.clone(),
                new: new.clone(),
            },
            _ => bail!("at most two revisions can be compared"),
        };
        Ok(DiffOption {
            path: self.path.clone(),
            orig_path: self.orig_path.clone(),
            target,
        })
    }
}

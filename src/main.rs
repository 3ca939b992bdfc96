use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::env;
use std::sync::Arc;

use revscope::cli::{Cli, Command, DiffArgs};
use revscope::config::{self, RevscopeConfig};
use revscope::error::LogSink;
use revscope::git::types::{DiffContent, DiffLineOrigin};
use revscope::{diff_worker, Repository};

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = config::load_config();
    if let Some(ref git) = cli.git {
        config.git = git.clone();
    }

    let start = match cli.repo {
        Some(ref p) => p.clone(),
        None => env::current_dir()?,
    };

    let repo = match Repository::discover(config.git.clone(), &start).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!(
                "revscope: {e}\n\
                 Run this command from inside a git working tree or pass --repo."
            );
            std::process::exit(1);
        }
    };

    let result = run(&cli, &config, repo).await;
    if let Err(ref e) = result {
        eprintln!("revscope: {e:#}");
    }
    result
}

async fn run(cli: &Cli, config: &RevscopeConfig, repo: Repository) -> Result<()> {
    match &cli.command {
        Command::Tags => {
            let tags = repo.query_tags().await.context("Failed to list tags")?;
            if cli.json {
                return print_json(&tags);
            }
            for tag in tags {
                println!("{}\t{}", tag.sha, tag.name);
            }
        }
        Command::Objects { revision, path } => {
            let objects = repo
                .query_revision_objects(revision, path.as_deref())
                .await
                .with_context(|| format!("Failed to list {revision}"))?;
            if cli.json {
                return print_json(&objects);
            }
            for obj in objects {
                println!("{} {}\t{}", obj.object_type.label(), obj.sha, obj.path);
            }
        }
        Command::Diff(args) => {
            let option = args.to_option()?;
            let repo = with_diff_settings(repo, config, args);
            let mut worker = diff_worker(repo, Arc::new(LogSink));
            let mut session = worker.create_session(option, None);
            worker.wait(&mut session).await;

            let Some(content) = session.content() else {
                anyhow::bail!("could not compute the diff of {}", session.file_path());
            };
            if cli.json {
                return print_json(content);
            }
            print_content(content);
        }
        Command::Difftool(args) => {
            let option = args.to_option()?;
            let tool = config
                .merge_tool
                .as_ref()
                .context("No merge tool configured in ~/.config/revscope/config.toml")?;
            let runtime = tokio::runtime::Handle::current();
            let handle = revscope::merge_tool::open_for_diff(&runtime, repo.git(), tool, &option)?;
            // Nothing else to do in this process, so stay alive until the tool exits.
            handle.await?;
        }
    }
    Ok(())
}

fn with_diff_settings(repo: Repository, config: &RevscopeConfig, args: &DiffArgs) -> Repository {
    let mut settings = config.diff;
    if let Some(n) = args.context_lines {
        settings.context_lines = n;
    }
    repo.with_settings(settings)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_content(content: &DiffContent) {
    match content {
        DiffContent::Binary(bin) => {
            println!("Binary file: {} -> {} bytes", bin.old_size, bin.new_size);
        }
        DiffContent::Lfs(lfs) => {
            println!("LFS object changed");
            println!("  old: {} ({} bytes)", lfs.old.oid, lfs.old.size);
            println!("  new: {} ({} bytes)", lfs.new.oid, lfs.new.size);
        }
        DiffContent::Text(text) => {
            println!(
                "{} (+{} -{})",
                text.file,
                text.additions(),
                text.deletions()
            );
            for hunk in &text.hunks {
                println!("{}", hunk.header);
                for line in &hunk.lines {
                    let sign = match line.origin {
                        DiffLineOrigin::Addition => '+',
                        DiffLineOrigin::Deletion => '-',
                        DiffLineOrigin::Context => ' ',
                    };
                    println!("{sign}{}", line.content);
                }
            }
        }
        DiffContent::NoChange => println!("No changes, or only line-ending changes"),
    }
}

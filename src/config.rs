use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::git::diff::DiffSettings;
use crate::merge_tool::MergeToolConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevscopeConfig {
    /// git executable to run.
    pub git: PathBuf,
    pub diff: DiffSettings,
    pub merge_tool: Option<MergeToolConfig>,
}

impl Default for RevscopeConfig {
    fn default() -> Self {
        Self {
            git: PathBuf::from("git"),
            diff: DiffSettings::default(),
            merge_tool: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    git: Option<PathBuf>,
    #[serde(default)]
    context_lines: Option<u32>,
    #[serde(default)]
    ignore_cr_at_eol: Option<bool>,
    #[serde(default)]
    merge_tool: Option<MergeToolConfig>,
}

fn config_path() -> PathBuf {
    let mut path = dirs_home().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("revscope");
    path.push("config.toml");
    path
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn parse_config(contents: &str) -> Result<RevscopeConfig, toml::de::Error> {
    let file: ConfigFile = toml::from_str(contents)?;
    let defaults = RevscopeConfig::default();

    Ok(RevscopeConfig {
        git: file.git.unwrap_or(defaults.git),
        diff: DiffSettings {
            context_lines: file.context_lines.unwrap_or(defaults.diff.context_lines),
            ignore_cr_at_eol: file
                .ignore_cr_at_eol
                .unwrap_or(defaults.diff.ignore_cr_at_eol),
        },
        merge_tool: file.merge_tool,
    })
}

/// Load config from `~/.config/revscope/config.toml`, falling back to defaults.
pub fn load_config() -> RevscopeConfig {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> RevscopeConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            log::debug!("no config at {}, using defaults", path.display());
            return RevscopeConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring invalid config {}: {e}", path.display());
            RevscopeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            git = "/opt/git/bin/git"
            context_lines = 8
            ignore_cr_at_eol = false

            [merge_tool]
            kind = "custom"
            path = "/usr/bin/difftastic"
            diff_cmd = "\"$LOCAL\" \"$REMOTE\""
            "#,
        )
        .unwrap();

        assert_eq!(config.git, PathBuf::from("/opt/git/bin/git"));
        assert_eq!(
            config.diff,
            DiffSettings {
                context_lines: 8,
                ignore_cr_at_eol: false,
            }
        );
        let tool = config.merge_tool.unwrap();
        assert_eq!(tool.kind, "custom");
        assert_eq!(tool.path, PathBuf::from("/usr/bin/difftastic"));
        assert_eq!(tool.diff_cmd, "\"$LOCAL\" \"$REMOTE\"");
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_config("").unwrap(), RevscopeConfig::default());
    }

    #[test]
    fn test_invalid_or_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_config_from(&dir.path().join("missing.toml")),
            RevscopeConfig::default()
        );

        let bad = dir.path().join("config.toml");
        std::fs::write(&bad, "context_lines = \"many\"").unwrap();
        assert_eq!(load_config_from(&bad), RevscopeConfig::default());
    }
}

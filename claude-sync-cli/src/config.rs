// Preferences file: $XDG_CONFIG_HOME/claude-sync/config.toml

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::{
    eyre::{eyre, Context},
    Result,
};
use serde::Deserialize;

pub const DEFAULT_SESSION_LIMIT: usize = 5;
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub output_path: Option<PathBuf>,
    pub obsidian_vault_path: Option<PathBuf>,
    pub claude_project_path: Option<PathBuf>,
    pub auto_git_commit: Option<bool>,
    pub session_limit: Option<usize>,
    pub interval_secs: Option<u64>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("claude-sync").join("config.toml"))
}

/// Explicit path must exist; the default path is optional
pub fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        default_config_path().filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            let config: FileConfig = toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))?;
            tracing::debug!(path = %p.display(), "loaded config");
            Ok(config.expanded())
        }
    }
}

impl FileConfig {
    fn expanded(self) -> Self {
        FileConfig {
            output_path: self.output_path.map(expand_home),
            obsidian_vault_path: self.obsidian_vault_path.map(expand_home),
            claude_project_path: self.claude_project_path.map(expand_home),
            ..self
        }
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: PathBuf) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path,
    }
}

// Per-destination sync progress, stored next to the exported Markdown

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::{eyre::Context, Result};
use serde::{Deserialize, Serialize};

pub const STATE_FILE: &str = ".claude-sync-state.json";

/// Non-blank log lines already exported, keyed by session file path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    #[serde(default)]
    pub last_synced_lines: BTreeMap<String, usize>,
}

impl SyncState {
    pub fn path(output_dir: &Path) -> PathBuf {
        output_dir.join(STATE_FILE)
    }

    /// Load the state for `output_dir`. Missing or corrupt files give an empty state.
    pub fn load(output_dir: &Path) -> Self {
        let state_file = Self::path(output_dir);
        if !state_file.exists() {
            return SyncState::default();
        }

        match Self::read(&state_file) {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(path = %state_file.display(), "ignoring sync state: {error:#}");
                SyncState::default()
            }
        }
    }

    fn read(state_file: &Path) -> Result<Self> {
        let content = fs::read_to_string(state_file)
            .with_context(|| format!("Failed to read {}", state_file.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", state_file.display()))
    }

    /// Overwrite the state file. Best effort: failures are logged, never returned.
    pub fn save(&self, output_dir: &Path) {
        let state_file = Self::path(output_dir);
        if let Err(error) = self.write(&state_file) {
            tracing::warn!(path = %state_file.display(), "failed to save sync state: {error:#}");
        }
    }

    fn write(&self, state_file: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(state_file, json)
            .with_context(|| format!("Failed to write {}", state_file.display()))
    }

    pub fn key(session_path: &Path) -> String {
        session_path.to_string_lossy().into_owned()
    }

    /// Marker for a session, 0 if never synced
    pub fn synced_lines(&self, session_path: &Path) -> usize {
        self.last_synced_lines
            .get(&Self::key(session_path))
            .copied()
            .unwrap_or(0)
    }

    /// Advance the marker. Never moves it backwards.
    pub fn advance(&mut self, session_path: &Path, line_count: usize) {
        let entry = self
            .last_synced_lines
            .entry(Self::key(session_path))
            .or_insert(0);
        *entry = (*entry).max(line_count);
    }
}

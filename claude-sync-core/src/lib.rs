// claude-sync Core Library
// Session discovery, parsing, and incremental Markdown sync for Claude Code logs

use std::path::{Path, PathBuf};

pub mod types;
pub mod adapters;
pub mod filter;
pub mod state;
pub mod markdown;
pub mod git;
pub mod sync;

// Re-export commonly used types
pub use types::*;
pub use adapters::SessionSource;
pub use adapters::claude_code::ClaudeCodeSource;
pub use filter::{messages_on, today_messages};
pub use state::SyncState;
pub use markdown::{format_markdown, project_slug};
pub use git::{GitCommitHook, PostWriteHook};
pub use sync::{sync_recent, sync_to_folder, sync_to_obsidian, Destination};

/// Session logs under `projects_root` (default `~/.claude/projects`), most recent first
pub fn find_session_files(projects_root: Option<&Path>) -> Vec<PathBuf> {
    ClaudeCodeSource::from_override(projects_root).find_session_files()
}

/// Messages of one session log; an unreadable file yields none
pub fn parse_session_file(path: &Path) -> Vec<Message> {
    ClaudeCodeSource::new().parse_session(path)
}

/// Up to `limit` parsed sessions, most recently modified first
pub fn get_recent_sessions(projects_root: Option<&Path>, limit: usize) -> Vec<Session> {
    ClaudeCodeSource::from_override(projects_root).recent_sessions(limit)
}

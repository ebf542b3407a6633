// Session sources: where conversation logs live and how to decode them

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use color_eyre::Result;

use crate::types::{Message, Session};

pub mod claude_code;

/// Trait for locating and decoding an assistant's session logs
pub trait SessionSource {
    /// Name of the source (e.g., "claude-code")
    fn name(&self) -> &'static str;

    /// Session log files, most recently modified first.
    /// A missing root yields an empty list.
    fn find_session_files(&self) -> Vec<PathBuf>;

    /// Decode one session log into normalized messages.
    /// Malformed records are skipped; only failing to read the file is an error.
    fn read_session(&self, path: &Path) -> Result<Vec<Message>>;

    /// Like `read_session`, but an unreadable file yields no messages
    fn parse_session(&self, path: &Path) -> Vec<Message> {
        match self.read_session(path) {
            Ok(messages) => messages,
            Err(error) => {
                tracing::warn!(source = self.name(), path = %path.display(), "{error:#}");
                Vec::new()
            }
        }
    }

    /// Parse up to `limit` of the most recent sessions, most recent first
    fn recent_sessions(&self, limit: usize) -> Vec<Session> {
        self.find_session_files()
            .into_iter()
            .take(limit)
            .filter_map(|file_path| {
                let modified = std::fs::metadata(&file_path)
                    .and_then(|metadata| metadata.modified());
                let last_modified: DateTime<Utc> = match modified {
                    Ok(modified) => modified.into(),
                    Err(error) => {
                        tracing::debug!(path = %file_path.display(), %error, "skipping session without mtime");
                        return None;
                    }
                };
                let messages = self.parse_session(&file_path);
                Some(Session {
                    file_path,
                    messages,
                    last_modified,
                })
            })
            .collect()
    }
}

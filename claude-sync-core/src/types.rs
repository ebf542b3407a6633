// Core type definitions for claude-sync

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parse a record role/type discriminator ("user", "assistant")
    pub fn from_record(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    /// Speaker name used in Markdown headings and listings
    pub fn speaker(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Claude",
        }
    }
}

/// Normalized message. `content` is always flattened plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, timestamp: Option<DateTime<Utc>>) -> Self {
        Message {
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// One parsed conversation log
#[derive(Debug, Clone)]
pub struct Session {
    pub file_path: PathBuf,
    pub messages: Vec<Message>,
    /// Modification time of the backing file; only used for ranking and display
    pub last_modified: DateTime<Utc>,
}

/// Outcome of syncing one session file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub file_path: Option<PathBuf>,
    pub messages_added: usize,
    pub error: Option<String>,
}

impl SyncResult {
    /// Nothing new to write
    pub fn unchanged() -> Self {
        SyncResult {
            success: true,
            file_path: None,
            messages_added: 0,
            error: None,
        }
    }

    pub fn written(file_path: PathBuf, messages_added: usize) -> Self {
        SyncResult {
            success: true,
            file_path: Some(file_path),
            messages_added,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        SyncResult {
            success: false,
            file_path: None,
            messages_added: 0,
            error: Some(error.into()),
        }
    }
}

/// Aggregate outcome of one sync pass over several sessions
#[derive(Debug, Clone, Default)]
pub struct PassSummary {
    pub sessions_found: usize,
    pub results: Vec<SyncResult>,
}

impl PassSummary {
    pub fn total_messages(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.messages_added)
            .sum()
    }

    /// Sessions that produced an artifact in this pass
    pub fn synced_projects(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.success && r.messages_added > 0)
            .count()
    }

    pub fn first_error(&self) -> Option<&str> {
        self.results.iter().find_map(|r| r.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_record() {
        assert_eq!(Role::from_record("user"), Some(Role::User));
        assert_eq!(Role::from_record("assistant"), Some(Role::Assistant));
        assert_eq!(Role::from_record("summary"), None);
    }

    #[test]
    fn test_pass_summary_counts() {
        let summary = PassSummary {
            sessions_found: 4,
            results: vec![
                SyncResult::written(PathBuf::from("a.md"), 3),
                SyncResult::unchanged(),
                SyncResult::failed("permission denied"),
                SyncResult::written(PathBuf::from("b.md"), 2),
            ],
        };

        assert_eq!(summary.total_messages(), 5);
        assert_eq!(summary.synced_projects(), 2);
        assert_eq!(summary.first_error(), Some("permission denied"));
    }

    #[test]
    fn test_failed_result_has_error() {
        let result = SyncResult::failed("boom");
        assert!(!result.success);
        assert_eq!(result.messages_added, 0);
        assert!(result.file_path.is_none());
        assert_eq!(result.error.as_deref(), Some("boom"));
    }
}

// Claude Code log adapter
// Reads from ~/.claude/projects/<project>/<sessionId>.jsonl files

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use color_eyre::{eyre::Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::SessionSource;
use crate::types::{Message, Role};

/// `~/.claude/projects`, if a home directory can be determined
pub fn default_projects_root() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claude").join("projects"))
}

pub struct ClaudeCodeSource {
    projects_root: Option<PathBuf>,
}

impl ClaudeCodeSource {
    /// Source rooted at the default per-user projects directory
    pub fn new() -> Self {
        ClaudeCodeSource {
            projects_root: default_projects_root(),
        }
    }

    pub fn with_root(projects_root: PathBuf) -> Self {
        ClaudeCodeSource {
            projects_root: Some(projects_root),
        }
    }

    /// Uses `root` when given, otherwise the default location
    pub fn from_override(root: Option<&Path>) -> Self {
        match root {
            Some(root) => Self::with_root(root.to_path_buf()),
            None => Self::new(),
        }
    }

    pub fn projects_root(&self) -> Option<&Path> {
        self.projects_root.as_deref()
    }
}

impl Default for ClaudeCodeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSource for ClaudeCodeSource {
    fn name(&self) -> &'static str {
        "claude-code"
    }

    fn find_session_files(&self) -> Vec<PathBuf> {
        let Some(root) = self.projects_root.as_deref() else {
            return Vec::new();
        };

        let project_entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::debug!(root = %root.display(), %error, "projects directory not readable");
                return Vec::new();
            }
        };

        let mut found: Vec<(PathBuf, SystemTime)> = Vec::new();

        for project_entry in project_entries.flatten() {
            let project_dir = project_entry.path();
            if !project_dir.is_dir() {
                continue;
            }

            let files = match fs::read_dir(&project_dir) {
                Ok(files) => files,
                Err(error) => {
                    tracing::debug!(dir = %project_dir.display(), %error, "skipping unreadable project directory");
                    continue;
                }
            };

            for file_entry in files.flatten() {
                let file_path = file_entry.path();
                if !is_session_log(&file_path) {
                    continue;
                }

                match fs::metadata(&file_path).and_then(|metadata| metadata.modified()) {
                    Ok(modified) => found.push((file_path, modified)),
                    Err(error) => {
                        tracing::debug!(path = %file_path.display(), %error, "skipping session without metadata");
                    }
                }
            }
        }

        found.sort_by(|a, b| b.1.cmp(&a.1));
        found.into_iter().map(|(path, _)| path).collect()
    }

    fn read_session(&self, path: &Path) -> Result<Vec<Message>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut messages = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(error) if error.kind() == io::ErrorKind::InvalidData => {
                    tracing::debug!(path = %path.display(), line = index + 1, "skipping non-UTF-8 line");
                    continue;
                }
                Err(error) => {
                    return Err(error)
                        .with_context(|| format!("Failed to read {}", path.display()));
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match decode_record(&line) {
                Some(message) => messages.push(message),
                None => {
                    tracing::trace!(path = %path.display(), line = index + 1, "record produced no message");
                }
            }
        }

        Ok(messages)
    }
}

/// Only UUID.jsonl files are sessions; agent-*.jsonl are sub-agent side logs
fn is_session_log(path: &Path) -> bool {
    if path.extension().and_then(|s| s.to_str()) != Some("jsonl") {
        return false;
    }
    if let Some(filename) = path.file_name().and_then(|s| s.to_str()) {
        if filename.starts_with("agent-") {
            return false;
        }
    }
    path.is_file()
}

/// Count of non-blank lines, the unit of the sync progress marker
pub fn count_non_blank_lines(path: &Path) -> Result<usize> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count())
}

#[derive(Debug, Deserialize)]
struct SessionRecord {
    #[serde(rename = "type")]
    record_type: Option<String>,
    message: Option<RecordMessage>,
    timestamp: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RecordMessage {
    role: Option<String>,
    #[serde(default)]
    content: Value,
}

/// Decode one JSONL line. Returns `None` for malformed lines, non-conversation
/// records, and records whose content flattens to nothing.
fn decode_record(line: &str) -> Option<Message> {
    let record: SessionRecord = match serde_json::from_str(line) {
        Ok(record) => record,
        Err(error) => {
            tracing::debug!(%error, "skipping malformed record");
            return None;
        }
    };

    let message = record.message?;
    let role = message
        .role
        .as_deref()
        .or(record.record_type.as_deref())
        .and_then(Role::from_record)?;

    let content = flatten_content(&message.content);
    if content.trim().is_empty() {
        return None;
    }

    let timestamp = record
        .timestamp
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));

    Some(Message::new(role, content, timestamp))
}

/// Flatten plain-string or block-array content into one string, blocks joined
/// by newlines in their original order
fn flatten_content(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(flatten_block)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

fn flatten_block(block: &Value) -> Option<String> {
    match block.get("type").and_then(Value::as_str)? {
        "text" => block.get("text").and_then(Value::as_str).map(String::from),
        "tool_use" => {
            let name = block.get("name").and_then(Value::as_str).unwrap_or("unknown");
            Some(format!("[Tool: {name}]"))
        }
        "tool_result" => {
            let text = block.get("content").map(flatten_content).unwrap_or_default();
            (!text.is_empty()).then_some(text)
        }
        // thinking, image, and anything newer
        _ => None,
    }
}

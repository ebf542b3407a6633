// Incremental sync of session logs into dated Markdown artifacts

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use color_eyre::{
    eyre::{Context, Report},
    Result,
};

use crate::adapters::claude_code::{count_non_blank_lines, ClaudeCodeSource};
use crate::adapters::SessionSource;
use crate::filter::messages_on;
use crate::git::{GitCommitHook, PostWriteHook};
use crate::markdown::{date_folder, format_markdown, project_slug};
use crate::state::SyncState;
use crate::types::{Message, PassSummary, SyncResult};

/// An output root that receives `<root>/<YYYY-MM-DD>/<project>.md` artifacts
pub struct Destination {
    root: PathBuf,
    hook: Option<Box<dyn PostWriteHook>>,
}

impl Destination {
    /// Plain folder, no post-write action
    pub fn folder(root: impl Into<PathBuf>) -> Self {
        Destination {
            root: root.into(),
            hook: None,
        }
    }

    /// Obsidian vault, optionally committing to git after each write
    pub fn vault(root: impl Into<PathBuf>, auto_commit: bool) -> Self {
        let destination = Self::folder(root);
        if auto_commit {
            destination.with_hook(GitCommitHook::new())
        } else {
            destination
        }
    }

    pub fn with_hook(mut self, hook: impl PostWriteHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sync one session against today's local date
    pub fn sync_session(&self, session_path: &Path, messages: &[Message]) -> SyncResult {
        self.sync_session_on(session_path, messages, Local::now().date_naive())
    }

    /// Sync one session as of `today`. Never fails: errors become a failed `SyncResult`.
    pub fn sync_session_on(
        &self,
        session_path: &Path,
        messages: &[Message],
        today: NaiveDate,
    ) -> SyncResult {
        match self.try_sync(session_path, messages, today) {
            Ok(Some((artifact, count))) => {
                self.run_hook(&artifact);
                SyncResult::written(artifact, count)
            }
            Ok(None) => SyncResult::unchanged(),
            Err(error) => {
                tracing::warn!(session = %session_path.display(), "sync failed: {error:#}");
                SyncResult::failed(describe(&error))
            }
        }
    }

    fn try_sync(
        &self,
        session_path: &Path,
        messages: &[Message],
        today: NaiveDate,
    ) -> Result<Option<(PathBuf, usize)>> {
        let date_dir = self.root.join(date_folder(today));
        fs::create_dir_all(&date_dir)
            .with_context(|| format!("Failed to create directory: {}", date_dir.display()))?;

        let todays = messages_on(messages, today);
        if todays.is_empty() {
            return Ok(None);
        }

        let mut state = SyncState::load(&self.root);
        let last_synced = state.synced_lines(session_path);
        let current = count_non_blank_lines(session_path)?;
        if current <= last_synced {
            tracing::debug!(session = %session_path.display(), current, last_synced, "no new lines");
            return Ok(None);
        }

        let project = project_slug(session_path);
        let artifact = date_dir.join(format!("{}.md", project));
        let markdown = format_markdown(&todays, &project, today);
        fs::write(&artifact, markdown)
            .with_context(|| format!("Failed to write {}", artifact.display()))?;
        tracing::info!(artifact = %artifact.display(), messages = todays.len(), "wrote artifact");

        state.advance(session_path, current);
        state.save(&self.root);

        Ok(Some((artifact, todays.len())))
    }

    fn run_hook(&self, artifact: &Path) {
        if let Some(hook) = &self.hook {
            if let Err(error) = hook.after_write(&self.root, artifact) {
                tracing::warn!(root = %self.root.display(), "post-write hook failed: {error:#}");
            }
        }
    }

    /// One pass over the `limit` most recent sessions from `source`
    pub fn run_pass(&self, source: &dyn SessionSource, limit: usize) -> PassSummary {
        self.run_pass_on(source, limit, Local::now().date_naive())
    }

    pub fn run_pass_on(
        &self,
        source: &dyn SessionSource,
        limit: usize,
        today: NaiveDate,
    ) -> PassSummary {
        let files = source.find_session_files();
        let results = files
            .iter()
            .take(limit)
            .map(|path| {
                let messages = source.parse_session(path);
                self.sync_session_on(path, &messages, today)
            })
            .collect();

        PassSummary {
            sessions_found: files.len(),
            results,
        }
    }
}

/// `outer: inner: root cause`
fn describe(error: &Report) -> String {
    error
        .chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

/// Sync a session's messages into a plain output folder
pub fn sync_to_folder(session_path: &Path, messages: &[Message], output_dir: &Path) -> SyncResult {
    Destination::folder(output_dir).sync_session(session_path, messages)
}

/// Sync into an Obsidian vault; with `auto_commit` the vault is committed after a write
pub fn sync_to_obsidian(
    session_path: &Path,
    messages: &[Message],
    vault_path: &Path,
    auto_commit: bool,
) -> SyncResult {
    Destination::vault(vault_path, auto_commit).sync_session(session_path, messages)
}

/// Sync the `limit` most recent sessions under `projects_root` (default location if `None`)
pub fn sync_recent(
    projects_root: Option<&Path>,
    limit: usize,
    destination: &Destination,
) -> PassSummary {
    let source = ClaudeCodeSource::from_override(projects_root);
    destination.run_pass(&source, limit)
}

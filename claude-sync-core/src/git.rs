// Git commit hook for version-controlled destinations (Obsidian vaults)

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use color_eyre::{
    eyre::{eyre, Context},
    Result,
};

use crate::state::STATE_FILE;

/// Action a destination runs after each successful artifact write
pub trait PostWriteHook {
    fn after_write(&self, root: &Path, artifact: &Path) -> Result<()>;
}

/// Commits each freshly written artifact to the git repository containing the vault
pub struct GitCommitHook {
    git: Option<PathBuf>,
}

impl GitCommitHook {
    /// Locate `git` on PATH. A missing binary surfaces when the hook runs.
    pub fn new() -> Self {
        GitCommitHook {
            git: which::which("git").ok(),
        }
    }

    pub fn with_binary(git: PathBuf) -> Self {
        GitCommitHook { git: Some(git) }
    }

    fn git(&self, root: &Path, args: &[&str]) -> Result<Output> {
        let git = self
            .git
            .as_ref()
            .ok_or_else(|| eyre!("git executable not found on PATH"))?;
        Command::new(git)
            .current_dir(root)
            .args(args)
            .output()
            .with_context(|| format!("Failed to run git {}", args.join(" ")))
    }

    /// `check-ignore` exits 0 when the path is ignored, 1 when it is not
    fn is_ignored(&self, root: &Path, path: &str) -> Result<bool> {
        let output = self.git(root, &["check-ignore", "-q", "--", path])?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(eyre!(
                "git check-ignore failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )),
        }
    }

    fn is_work_tree(&self, root: &Path) -> Result<bool> {
        let output = self.git(root, &["rev-parse", "--is-inside-work-tree"])?;
        Ok(output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }
}

impl Default for GitCommitHook {
    fn default() -> Self {
        Self::new()
    }
}

impl PostWriteHook for GitCommitHook {
    fn after_write(&self, root: &Path, artifact: &Path) -> Result<()> {
        if !self.is_work_tree(root)? {
            return Err(eyre!("{} is not inside a git work tree", root.display()));
        }

        let relative = artifact.strip_prefix(root).unwrap_or(artifact);
        let relative = relative.to_string_lossy();
        let mut paths = vec![relative.as_ref()];
        if root.join(STATE_FILE).exists() && !self.is_ignored(root, STATE_FILE)? {
            paths.push(STATE_FILE);
        }

        let added = self.git(root, &with_paths(&["add", "--"], &paths))?;
        if !added.status.success() {
            return Err(eyre!(
                "git add failed: {}",
                String::from_utf8_lossy(&added.stderr).trim()
            ));
        }

        // An unchanged artifact leaves nothing staged
        let staged = self.git(root, &with_paths(&["diff", "--cached", "--quiet", "--"], &paths))?;
        if staged.status.success() {
            tracing::debug!(root = %root.display(), "nothing to commit");
            return Ok(());
        }

        // Pathspecs keep anything else the user staged out of the commit
        let message = commit_message(artifact);
        let committed = self.git(
            root,
            &with_paths(&["commit", "-m", message.as_str(), "--"], &paths),
        )?;
        if !committed.status.success() {
            return Err(eyre!(
                "git commit failed: {}",
                String::from_utf8_lossy(&committed.stderr).trim()
            ));
        }

        tracing::info!(root = %root.display(), %message, "committed vault");
        Ok(())
    }
}

fn with_paths<'a>(args: &[&'a str], paths: &[&'a str]) -> Vec<&'a str> {
    args.iter().chain(paths).copied().collect()
}

/// `claude-sync: 2024-03-15 my-app` from `<root>/2024-03-15/my-app.md`
fn commit_message(artifact: &Path) -> String {
    let slug = artifact
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let date = artifact
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("claude-sync: {} {}", date, slug)
}

// claude-sync CLI - Mirror Claude Code conversations into daily Markdown notes
// Writes <destination>/<YYYY-MM-DD>/<project>.md and tracks progress per session

mod config;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand};
use claude_sync_core::markdown::long_date;
use claude_sync_core::{get_recent_sessions, sync_recent, Destination, PassSummary, Session};
use color_eyre::{eyre::eyre, Result};
use tracing_subscriber::EnvFilter;

use config::{FileConfig, DEFAULT_INTERVAL_SECS, DEFAULT_SESSION_LIMIT};

const LIST_TAIL: usize = 20;
const LIST_PREVIEW_CHARS: usize = 80;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_cfg = config::load_file_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Sync(args) => handle_sync(args, &file_cfg)?,
        Command::Watch(args) => handle_watch(args, &file_cfg).await?,
        Command::List(args) => handle_list(args, &file_cfg),
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "claude-sync",
    author,
    version,
    about = "Mirror Claude Code conversations into daily Markdown notes",
    long_about = "Exports today's Claude Code conversations to <destination>/<YYYY-MM-DD>/<project>.md.\nRe-running only rewrites a note when its session log has grown."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Path to a config file (default: $XDG_CONFIG_HOME/claude-sync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync the most recent sessions once
    Sync(SyncArgs),
    /// Sync now and then on an interval until interrupted
    Watch(WatchArgs),
    /// Show recent conversations
    List(ListArgs),
}

#[derive(Args, Debug)]
struct SyncArgs {
    /// Output folder for Markdown notes
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// Obsidian vault to sync into (takes precedence over --output)
    #[arg(long, value_name = "DIR")]
    vault: Option<PathBuf>,
    /// Commit the vault to git after each write
    #[arg(long)]
    commit: bool,
    /// Claude Code projects directory (default: ~/.claude/projects)
    #[arg(short, long, value_name = "DIR")]
    projects: Option<PathBuf>,
    /// Number of most recent sessions to consider
    #[arg(short, long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[command(flatten)]
    sync: SyncArgs,
    /// Seconds between passes
    #[arg(short, long)]
    interval: Option<u64>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Claude Code projects directory (default: ~/.claude/projects)
    #[arg(short, long, value_name = "DIR")]
    projects: Option<PathBuf>,
    /// Number of sessions to show
    #[arg(short, long)]
    limit: Option<usize>,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "claude_sync=debug,claude_sync_core=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolved settings for one sync/watch invocation (CLI > config > default)
struct SyncPlan {
    destination: Destination,
    projects: Option<PathBuf>,
    limit: usize,
}

fn resolve_plan(args: &SyncArgs, file_cfg: &FileConfig) -> Result<SyncPlan> {
    let auto_commit = args.commit || file_cfg.auto_git_commit.unwrap_or(false);

    let destination = if let Some(vault) = &args.vault {
        Destination::vault(vault, auto_commit)
    } else if let Some(output) = args.output.as_ref().or(file_cfg.output_path.as_ref()) {
        Destination::folder(output)
    } else if let Some(vault) = &file_cfg.obsidian_vault_path {
        Destination::vault(vault, auto_commit)
    } else {
        return Err(eyre!(
            "No destination configured.\nUse --output or --vault, or set output_path in config.toml."
        ));
    };

    Ok(SyncPlan {
        destination,
        projects: args
            .projects
            .clone()
            .or_else(|| file_cfg.claude_project_path.clone()),
        limit: args
            .limit
            .or(file_cfg.session_limit)
            .unwrap_or(DEFAULT_SESSION_LIMIT),
    })
}

impl SyncPlan {
    fn run(&self) -> PassSummary {
        sync_recent(self.projects.as_deref(), self.limit, &self.destination)
    }
}

fn handle_sync(args: &SyncArgs, file_cfg: &FileConfig) -> Result<()> {
    let plan = resolve_plan(args, file_cfg)?;
    let summary = plan.run();

    if summary.sessions_found == 0 {
        println!("No active Claude sessions found");
        return Ok(());
    }

    let total = summary.total_messages();
    if total > 0 {
        println!(
            "✓ Synced {} messages from {} project(s)",
            total,
            summary.synced_projects()
        );
        for path in summary.results.iter().filter_map(|r| r.file_path.as_ref()) {
            println!("  {}", path.display());
        }
    } else {
        println!("No new messages to sync");
    }

    if let Some(error) = summary.first_error() {
        eprintln!("⚠ Sync failed for some sessions: {}", error);
    }
    Ok(())
}

async fn handle_watch(args: &WatchArgs, file_cfg: &FileConfig) -> Result<()> {
    let plan = resolve_plan(&args.sync, file_cfg)?;
    let interval_secs = args
        .interval
        .or(file_cfg.interval_secs)
        .unwrap_or(DEFAULT_INTERVAL_SECS)
        .max(1);

    eprintln!(
        "Watching Claude sessions every {}s → {} (Ctrl-C to stop)",
        interval_secs,
        plan.destination.root().display()
    );

    watch_until(&plan, interval_secs, tokio::signal::ctrl_c()).await;
    eprintln!("Stopped");
    Ok(())
}

/// Run a pass every `interval_secs` until `shutdown` resolves; returns the pass count.
/// `shutdown` is polled across ticks, so a signal that arrives during a pass is kept.
async fn watch_until<F: Future>(plan: &SyncPlan, interval_secs: u64, shutdown: F) -> usize {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut passes = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let summary = plan.run();
                passes += 1;
                println!("{}", status_line(&summary, Local::now()));
            }
            _ = &mut shutdown => break,
        }
    }
    passes
}

fn status_line(summary: &PassSummary, at: DateTime<Local>) -> String {
    let mut line = format!(
        "Last sync: {} | Messages: {}",
        at.format("%H:%M"),
        summary.total_messages()
    );
    if let Some(error) = summary.first_error() {
        line.push_str(&format!(" | Error: {}", error));
    }
    line
}

fn handle_list(args: &ListArgs, file_cfg: &FileConfig) {
    let projects = args
        .projects
        .clone()
        .or_else(|| file_cfg.claude_project_path.clone());
    let limit = args
        .limit
        .or(file_cfg.session_limit)
        .unwrap_or(DEFAULT_SESSION_LIMIT);

    let sessions = get_recent_sessions(projects.as_deref(), limit);
    if sessions.is_empty() {
        println!("No recent Claude Code sessions found. Start a conversation in Claude Code first.");
        return;
    }

    for session in &sessions {
        print!("{}", render_session(session));
    }
}

fn render_session(session: &Session) -> String {
    let project_dir = session
        .file_path
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let modified = session.last_modified.with_timezone(&Local).date_naive();

    let mut out = format!(
        "{} - {}  ({} messages)\n",
        long_date(modified),
        project_dir,
        session.messages.len()
    );

    let skip = session.messages.len().saturating_sub(LIST_TAIL);
    for message in &session.messages[skip..] {
        out.push_str(&format!(
            "  [{}] {}: {}\n",
            message.timestamp.map(local_time).unwrap_or_default(),
            message.role.speaker(),
            truncate(&message.content, LIST_PREVIEW_CHARS)
        ));
    }
    out.push('\n');
    out
}

fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

/// First `max_chars` characters on one line, with `...` when cut
fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use claude_sync_core::{Message, Role, SyncResult};

    fn sync_args() -> SyncArgs {
        SyncArgs {
            output: None,
            vault: None,
            commit: false,
            projects: None,
            limit: None,
        }
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "claude-sync",
            "watch",
            "--output",
            "/notes",
            "--interval",
            "60",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Watch(args) => {
                assert_eq!(args.interval, Some(60));
                assert_eq!(args.sync.output, Some(PathBuf::from("/notes")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_plan_precedence() -> Result<()> {
        let file_cfg = FileConfig {
            output_path: Some(PathBuf::from("/from-config")),
            session_limit: Some(9),
            claude_project_path: Some(PathBuf::from("/claude/projects")),
            ..FileConfig::default()
        };

        let mut args = sync_args();
        let plan = resolve_plan(&args, &file_cfg)?;
        assert_eq!(plan.destination.root(), PathBuf::from("/from-config"));
        assert_eq!(plan.limit, 9);
        assert_eq!(plan.projects, Some(PathBuf::from("/claude/projects")));

        args.output = Some(PathBuf::from("/from-cli"));
        args.limit = Some(2);
        let plan = resolve_plan(&args, &file_cfg)?;
        assert_eq!(plan.destination.root(), PathBuf::from("/from-cli"));
        assert_eq!(plan.limit, 2);

        args.vault = Some(PathBuf::from("/vault"));
        let plan = resolve_plan(&args, &file_cfg)?;
        assert_eq!(plan.destination.root(), PathBuf::from("/vault"));
        Ok(())
    }

    #[test]
    fn test_resolve_plan_falls_back_to_vault_config() -> Result<()> {
        let file_cfg = FileConfig {
            obsidian_vault_path: Some(PathBuf::from("/vault")),
            ..FileConfig::default()
        };
        let plan = resolve_plan(&sync_args(), &file_cfg)?;
        assert_eq!(plan.destination.root(), PathBuf::from("/vault"));
        assert_eq!(plan.limit, DEFAULT_SESSION_LIMIT);
        Ok(())
    }

    #[test]
    fn test_resolve_plan_requires_destination() {
        assert!(resolve_plan(&sync_args(), &FileConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_watch_stops_when_shutdown_fires_between_ticks() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let projects = temp_dir.path().join("projects");
        std::fs::create_dir_all(&projects)?;
        let plan = SyncPlan {
            destination: Destination::folder(temp_dir.path().join("notes")),
            projects: Some(projects),
            limit: DEFAULT_SESSION_LIMIT,
        };

        // Ticks at 0s and 1s; a shutdown rebuilt on every tick would never see 1.5s
        let shutdown = tokio::time::sleep(Duration::from_millis(1500));
        let passes = tokio::time::timeout(
            Duration::from_secs(5),
            watch_until(&plan, 1, shutdown),
        )
        .await?;
        assert_eq!(passes, 2);
        Ok(())
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 80), "short");
        assert_eq!(truncate("line one\nline two", 80), "line one line two");
        assert_eq!(truncate("こんにちは世界", 5), "こんにちは...");
    }

    #[test]
    fn test_status_line() {
        let at = Local.with_ymd_and_hms(2025, 3, 15, 9, 5, 0).unwrap();
        let summary = PassSummary {
            sessions_found: 2,
            results: vec![
                SyncResult::written(PathBuf::from("a.md"), 4),
                SyncResult::failed("Failed to write b.md: Permission denied"),
            ],
        };
        assert_eq!(
            status_line(&summary, at),
            "Last sync: 09:05 | Messages: 4 | Error: Failed to write b.md: Permission denied"
        );
    }

    #[test]
    fn test_render_session_shows_tail() {
        let messages: Vec<Message> = (0..25)
            .map(|i| Message::new(Role::User, format!("message {}", i), None))
            .collect();
        let session = Session {
            file_path: PathBuf::from("/p/-Users-alice-dev-app/s.jsonl"),
            messages,
            last_modified: Utc::now(),
        };

        let rendered = render_session(&session);
        let first = rendered.lines().next().unwrap();
        assert!(first.ends_with(" - -Users-alice-dev-app  (25 messages)"));
        assert!(!rendered.contains("message 4\n"));
        assert!(rendered.contains("  [] User: message 5\n"));
        assert!(rendered.contains("  [] User: message 24\n"));
        assert_eq!(rendered.lines().filter(|l| l.starts_with("  [")).count(), 20);
    }
}

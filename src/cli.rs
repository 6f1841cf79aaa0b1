//! Command-line interface for downtidy.
//!
//! Parses arguments, loads configuration, and wires the relocation engine to
//! the audit log and terminal output. Supports:
//! - a single organizing pass
//! - a dry run that only reports the plan
//! - undo of the last pass
//! - watch mode, repeating the pass on an interval

use crate::audit_log::FileAuditLog;
use crate::config::{AppConfig, ConfigError};
use crate::file_organizer::HistoryError;
use crate::output::OutputFormatter;
use crate::relocation::{RelocationEngine, ScanError, ScanOutcome};
use crate::undo::UndoManager;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Sort a downloads folder into category subfolders by file extension
#[derive(Parser, Debug)]
#[command(name = "downtidy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to organize
    pub directory: PathBuf,

    /// Show what would be moved without touching anything
    #[arg(long, conflicts_with_all = ["undo", "watch"])]
    pub dry_run: bool,

    /// Move the files of the last run back where they were
    #[arg(long, conflicts_with = "watch")]
    pub undo: bool,

    /// Keep running, organizing the directory on every interval
    #[arg(short, long)]
    pub watch: bool,

    /// Seconds between passes in watch mode (overrides the config file)
    #[arg(long, requires = "watch")]
    pub interval: Option<u64>,

    /// Configuration file (default: ./.downtidy.toml, then ~/.config/downtidy/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn command(&self) -> OrganizeCommand {
        if self.undo {
            OrganizeCommand::Undo
        } else if self.watch {
            OrganizeCommand::Watch {
                interval_secs: self.interval,
            }
        } else {
            OrganizeCommand::Organize {
                dry_run: self.dry_run,
            }
        }
    }
}

/// A CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Organize files once.
    Organize {
        /// If true, report the plan without making changes.
        dry_run: bool,
    },
    /// Undo the previous organization.
    Undo,
    /// Organize repeatedly until interrupted.
    Watch {
        /// Overrides the configured interval.
        interval_secs: Option<u64>,
    },
}

/// Fatal errors. Anything here ends the process with a non-zero status.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Installs the stderr `tracing` subscriber. `RUST_LOG` takes precedence.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Runs a command against a directory using the default configuration lookup.
///
/// # Examples
///
/// ```no_run
/// use downtidy::cli::{run_cli, OrganizeCommand};
/// use std::path::Path;
///
/// let dir = Path::new("/home/me/Downloads");
/// let result = run_cli(OrganizeCommand::Organize { dry_run: false }, dir);
/// if let Err(e) = result {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, dir_path: &Path) -> Result<(), CliError> {
    run_cli_with_config(command, dir_path, None)
}

/// Runs a command with an optional explicit configuration file.
pub fn run_cli_with_config(
    command: OrganizeCommand,
    dir_path: &Path,
    config_path: Option<&Path>,
) -> Result<(), CliError> {
    let config = AppConfig::load(config_path)?;
    match command {
        OrganizeCommand::Organize { dry_run: false } => {
            organize_directory(dir_path, &config).map(|_| ())
        }
        OrganizeCommand::Organize { dry_run: true } => {
            organize_directory_dry_run(dir_path, &config).map(|_| ())
        }
        OrganizeCommand::Undo => undo_organization(dir_path, &config),
        OrganizeCommand::Watch { interval_secs } => {
            let secs = interval_secs.unwrap_or(config.watch.interval_secs).max(1);
            watch_directory(dir_path, &config, Duration::from_secs(secs))
        }
    }
}

fn file_audit_log(dir_path: &Path, config: &AppConfig) -> FileAuditLog {
    FileAuditLog::with_file_names(dir_path, &config.log.action_file, &config.log.debug_file)
}

/// Runs one organizing pass and prints its summary line.
pub fn organize_directory(dir_path: &Path, config: &AppConfig) -> Result<ScanOutcome, CliError> {
    let engine = RelocationEngine::from_config(config)?;
    OutputFormatter::info(&format!("Organizing contents of: {}", dir_path.display()));

    let mut log = file_audit_log(dir_path, config);
    let outcome = engine.run_once(dir_path, &mut log)?;

    OutputFormatter::summary(&outcome);
    if outcome.moved + outcome.others > 0 {
        OutputFormatter::success(&format!(
            "Done. Use 'downtidy {} --undo' to revert.",
            dir_path.display()
        ));
    }
    Ok(outcome)
}

/// Reports what a pass would do, without moving files or writing logs.
pub fn organize_directory_dry_run(
    dir_path: &Path,
    config: &AppConfig,
) -> Result<ScanOutcome, CliError> {
    let engine = RelocationEngine::from_config(config)?;
    OutputFormatter::info(&format!("DRY RUN: Analyzing contents of: {}", dir_path.display()));

    let plan = engine.plan(dir_path)?;
    let outcome = ScanOutcome::projected(&plan);
    for entry in &plan {
        tracing::debug!(name = %entry.name, decision = ?entry.decision, "planned");
    }

    OutputFormatter::dry_run_plan(&plan);
    OutputFormatter::category_table(&plan);
    OutputFormatter::summary(&outcome);
    OutputFormatter::success("Dry run complete. No files were modified.");
    Ok(outcome)
}

fn undo_organization(dir_path: &Path, config: &AppConfig) -> Result<(), CliError> {
    OutputFormatter::info("Undoing previous organization...");

    let mut log = file_audit_log(dir_path, config);
    let report = UndoManager::undo(dir_path, &mut log)?;

    OutputFormatter::success(&format!("Restored: {}", report.restored_files));
    if !report.skipped_files.is_empty() {
        OutputFormatter::warning(&format!("Skipped: {}", report.skipped_files.len()));
        for (path, reason) in &report.skipped_files {
            println!("    - {}: {}", path.display(), reason);
        }
    }
    if !report.failed_restores.is_empty() {
        OutputFormatter::error(&format!("Failed: {}", report.failed_restores.len()));
        for (path, reason) in &report.failed_restores {
            eprintln!("    - {}: {}", path.display(), reason);
        }
        OutputFormatter::warning("History file was kept. Fix the issues above and try again.");
    }
    Ok(())
}

/// Organizes `dir_path` every `interval` until the process is stopped or the
/// directory can no longer be listed.
fn watch_directory(
    dir_path: &Path,
    config: &AppConfig,
    interval: Duration,
) -> Result<(), CliError> {
    let engine = RelocationEngine::from_config(config)?;
    OutputFormatter::info(&format!(
        "Watching {} every {}s (Ctrl-C to stop)",
        dir_path.display(),
        interval.as_secs()
    ));

    let mut log = file_audit_log(dir_path, config);
    loop {
        let outcome = engine.run_once(dir_path, &mut log)?;
        OutputFormatter::summary(&outcome);
        OutputFormatter::wait_with_spinner(interval);
    }
}

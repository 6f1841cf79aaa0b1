//! Append-only action and debug logs.
//!
//! Every relocation decision is written as a `[YYYY-MM-DD HH:MM:SS] message`
//! line. Actions (completed moves) and debug detail (skips, failures,
//! summaries) go to separate files so the action log stays a clean audit
//! trail.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_ACTION_LOG: &str = "automation_log.txt";
pub const DEFAULT_DEBUG_LOG: &str = "automation_debug_log.txt";

/// Sink for relocation audit messages.
pub trait AuditLog {
    /// Records a completed action.
    fn log_action(&mut self, message: &str);

    /// Records diagnostic detail.
    fn log_debug(&mut self, message: &str);

    /// File names this log owns inside the scanned directory.
    ///
    /// The relocation engine never moves these.
    fn owned_files(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Writes audit lines to two files and mirrors them to `tracing`.
///
/// A line that cannot be written is reported through `tracing` and dropped;
/// logging never interrupts a run.
#[derive(Debug, Clone)]
pub struct FileAuditLog {
    dir: PathBuf,
    action_file: String,
    debug_file: String,
}

impl FileAuditLog {
    /// Creates a logger writing the default file names inside `dir`.
    pub fn new(dir: &Path) -> Self {
        Self::with_file_names(dir, DEFAULT_ACTION_LOG, DEFAULT_DEBUG_LOG)
    }

    pub fn with_file_names(dir: &Path, action_file: &str, debug_file: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            action_file: action_file.to_string(),
            debug_file: debug_file.to_string(),
        }
    }

    pub fn action_path(&self) -> PathBuf {
        self.dir.join(&self.action_file)
    }

    pub fn debug_path(&self) -> PathBuf {
        self.dir.join(&self.debug_file)
    }

    fn append(path: &Path, message: &str) {
        let line = format_line(&chrono::Local::now(), message);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(e) = result {
            tracing::warn!("Could not write to {}: {}", path.display(), e);
        }
    }
}

impl AuditLog for FileAuditLog {
    fn log_action(&mut self, message: &str) {
        tracing::info!("{}", message);
        Self::append(&self.action_path(), message);
    }

    fn log_debug(&mut self, message: &str) {
        tracing::debug!("{}", message);
        Self::append(&self.debug_path(), message);
    }

    fn owned_files(&self) -> Vec<String> {
        vec![self.action_file.clone(), self.debug_file.clone()]
    }
}

fn format_line<Tz: chrono::TimeZone>(time: &chrono::DateTime<Tz>, message: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("[{}] {}\n", time.format("%Y-%m-%d %H:%M:%S"), message)
}

/// Reverting the most recent relocation pass.
///
/// Moves every file recorded in the relocation journal back to where it was,
/// newest first.
use crate::audit_log::AuditLog;
use crate::file_organizer::{FileOrganizer, HistoryError, Operation, OperationLog};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of an undo.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files moved back.
    pub restored_files: usize,
    /// Files that could not be moved back, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files that were no longer where the journal said.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// True if every recorded move was reverted.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

enum RestoreError {
    Missing(PathBuf),
    Failed(PathBuf, String),
}

/// Reverts relocation passes using the journal.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the last pass that moved files in `base_path`.
    ///
    /// * A file no longer at its moved location is skipped.
    /// * A file now occupying the original location is renamed to
    ///   `<name>.bak.<YYYYmmdd-HHMMSS>` first.
    /// * Any other failure is recorded and the remaining files are still tried.
    ///
    /// The journal is deleted only when every file was restored.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use downtidy::audit_log::FileAuditLog;
    /// use downtidy::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// let dir = Path::new("/home/me/Downloads");
    /// let mut log = FileAuditLog::new(dir);
    /// match UndoManager::undo(dir, &mut log) {
    ///     Ok(report) => println!("Restored {} files", report.restored_files),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(base_path: &Path, log: &mut dyn AuditLog) -> Result<UndoReport, HistoryError> {
        if !base_path.is_dir() {
            return Err(HistoryError::MissingBasePath(base_path.to_path_buf()));
        }

        let history = OperationLog::load(base_path)?.ok_or(HistoryError::NoHistory)?;
        log.log_debug(&format!(
            "=== Undoing run from {} ({} moves) ===",
            history.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            history.operations.len()
        ));

        let mut report = UndoReport::default();
        for operation in history.operations.iter().rev() {
            match Self::restore_file(operation) {
                Ok(()) => {
                    log.log_action(&format!(
                        "Restored: {} -> {}",
                        operation.new_path.display(),
                        operation.original_path.display()
                    ));
                    report.restored_files += 1;
                }
                Err(RestoreError::Missing(path)) => {
                    log.log_debug(&format!("Skipping restore, not found: {}", path.display()));
                    report
                        .skipped_files
                        .push((path, "File not found at expected location".to_string()));
                }
                Err(RestoreError::Failed(path, reason)) => {
                    log.log_debug(&format!("Failed to restore {}: {}", path.display(), reason));
                    report.failed_restores.push((path, reason));
                }
            }
        }

        if report.is_complete_success()
            && let Err(e) = OperationLog::delete(base_path)
        {
            log.log_debug(&format!("Could not delete history file: {}", e));
        }

        Ok(report)
    }

    fn restore_file(operation: &Operation) -> Result<(), RestoreError> {
        if fs::symlink_metadata(&operation.new_path).is_err() {
            return Err(RestoreError::Missing(operation.new_path.clone()));
        }

        if fs::symlink_metadata(&operation.original_path).is_ok() {
            let backup_path = Self::generate_backup_path(&operation.original_path);
            fs::rename(&operation.original_path, &backup_path).map_err(|e| {
                RestoreError::Failed(
                    operation.original_path.clone(),
                    format!("Could not back up conflicting file: {}", e),
                )
            })?;
        }

        FileOrganizer::move_file(&operation.new_path, &operation.original_path).map_err(|e| {
            RestoreError::Failed(
                operation.new_path.clone(),
                format!("Failed to restore file: {}", e),
            )
        })
    }

    /// `file.txt` becomes `file.txt.bak.20251109-143052`.
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        original_path.with_file_name(format!("{}.bak.{}", filename, timestamp))
    }
}

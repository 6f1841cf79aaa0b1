/// File relocation primitives and the relocation journal.
///
/// This module moves single files into category subdirectories of a base
/// directory, refusing to overwrite anything already at the destination,
/// and records each move in a JSON journal so a run can be undone.
use crate::file_category::CategoryRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Journal file written into the scanned directory.
pub const HISTORY_FILE: &str = ".downtidy_history.json";

/// A single completed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Where the file was before the move.
    pub original_path: PathBuf,
    /// Where the file is now.
    pub new_path: PathBuf,
    /// The category the file was moved to.
    pub category: String,
}

/// All moves made by one run, persisted for undo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    /// When the run started.
    pub timestamp: DateTime<Utc>,
    /// The directory that was organized.
    pub base_path: PathBuf,
    pub operations: Vec<Operation>,
}

impl OperationLog {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            timestamp: Utc::now(),
            base_path,
            operations: Vec::new(),
        }
    }

    pub fn add_operation(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    fn history_file_path(base_path: &Path) -> PathBuf {
        base_path.join(HISTORY_FILE)
    }

    /// Writes this log as pretty JSON, replacing any previous journal.
    pub fn save(&self, base_path: &Path) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| HistoryError::InvalidFormat(e.to_string()))?;
        fs::write(Self::history_file_path(base_path), json).map_err(HistoryError::Write)
    }

    /// Loads the journal, or `None` if there is none.
    pub fn load(base_path: &Path) -> Result<Option<Self>, HistoryError> {
        let history_path = Self::history_file_path(base_path);
        if !history_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&history_path).map_err(HistoryError::Read)?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| HistoryError::InvalidFormat(e.to_string()))
    }

    pub fn delete(base_path: &Path) -> Result<(), HistoryError> {
        let history_path = Self::history_file_path(base_path);
        if history_path.exists() {
            fs::remove_file(&history_path).map_err(HistoryError::Write)?;
        }
        Ok(())
    }
}

/// Per-file move failures. These never abort a run.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Destination folder {} does not exist", .path.display())]
    DestinationMissing { path: PathBuf },

    #[error("{} already exists", .destination.display())]
    Collision { destination: PathBuf },

    #[error("{} has no file name component", .path.display())]
    NoFileName { path: PathBuf },

    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors reading or writing the relocation journal.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Directory {} does not exist", .0.display())]
    MissingBasePath(PathBuf),

    #[error("No previous organization found to undo")]
    NoHistory,

    #[error("Failed to read history file: {0}")]
    Read(#[source] io::Error),

    #[error("Failed to write history file: {0}")]
    Write(#[source] io::Error),

    #[error("Invalid history file format: {0}")]
    InvalidFormat(String),
}

/// Moves files into category subdirectories.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Creates a folder for every registered category inside `base_path`.
    ///
    /// Existing folders are left alone. Returns the folders that could not be
    /// created; moves into those will fail later as [`MoveError::DestinationMissing`].
    pub fn prepare_category_dirs(base_path: &Path, registry: &CategoryRegistry) -> Vec<MoveError> {
        registry
            .iter()
            .filter_map(|category| {
                let path = base_path.join(category.dir_name());
                fs::create_dir_all(&path)
                    .err()
                    .map(|source| MoveError::DirectoryCreationFailed { path, source })
            })
            .collect()
    }

    /// Moves `file_path` into `base_path/category_dir_name/` under the same name.
    ///
    /// The category folder must already exist. An existing entry at the
    /// destination is never replaced. If `rename` fails because source and
    /// destination are on different filesystems, the file is copied and the
    /// source removed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use downtidy::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let result = FileOrganizer::relocate(
    ///     Path::new("/home/me/Downloads"),
    ///     Path::new("/home/me/Downloads/cat.png"),
    ///     "Images",
    /// );
    /// match result {
    ///     Ok(op) => println!("Moved to {}", op.new_path.display()),
    ///     Err(e) => eprintln!("{}", e),
    /// }
    /// ```
    pub fn relocate(
        base_path: &Path,
        file_path: &Path,
        category_dir_name: &str,
    ) -> Result<Operation, MoveError> {
        let category_path = base_path.join(category_dir_name);
        if !category_path.is_dir() {
            return Err(MoveError::DestinationMissing {
                path: category_path,
            });
        }

        let file_name = file_path.file_name().ok_or_else(|| MoveError::NoFileName {
            path: file_path.to_path_buf(),
        })?;
        let destination_path = category_path.join(file_name);

        // symlink_metadata so a dangling link at the destination also counts.
        if fs::symlink_metadata(&destination_path).is_ok() {
            return Err(MoveError::Collision {
                destination: destination_path,
            });
        }

        Self::move_file(file_path, &destination_path).map_err(|source| MoveError::Io {
            from: file_path.to_path_buf(),
            to: destination_path.clone(),
            source,
        })?;

        Ok(Operation {
            original_path: file_path.to_path_buf(),
            new_path: destination_path,
            category: category_dir_name.to_string(),
        })
    }

    /// Renames, falling back to copy + delete across filesystems.
    pub(crate) fn move_file(from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => Self::copy_then_remove(from, to),
            other => other,
        }
    }

    /// Copies `from` to `to`, then deletes `from`.
    ///
    /// On any failure the source is kept and whatever was written at `to` is
    /// removed, so exactly one complete copy remains.
    pub(crate) fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
        let preexisting = fs::symlink_metadata(to).is_ok();

        if let Err(e) = fs::copy(from, to) {
            if !preexisting {
                Self::discard_partial(to);
            }
            return Err(e);
        }

        if let Err(e) = fs::remove_file(from) {
            Self::discard_partial(to);
            return Err(e);
        }
        Ok(())
    }

    fn discard_partial(path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not remove partial copy {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup(categories: &[&str]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for category in categories {
            fs::create_dir(temp_dir.path().join(category)).expect("Failed to create category");
        }
        temp_dir
    }

    #[test]
    fn test_prepare_category_dirs_creates_all() {
        let temp_dir = setup(&[]);
        let registry = CategoryRegistry::default();

        let failures = FileOrganizer::prepare_category_dirs(temp_dir.path(), &registry);
        assert!(failures.is_empty());
        for category in registry.iter() {
            assert!(temp_dir.path().join(category.dir_name()).is_dir());
        }

        // Second call is a no-op.
        assert!(FileOrganizer::prepare_category_dirs(temp_dir.path(), &registry).is_empty());
    }

    #[test]
    fn test_prepare_category_dirs_reports_blocked_folder() {
        let temp_dir = setup(&[]);
        fs::write(temp_dir.path().join("Images"), "not a dir").unwrap();

        let failures =
            FileOrganizer::prepare_category_dirs(temp_dir.path(), &CategoryRegistry::default());
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            &failures[0],
            MoveError::DirectoryCreationFailed { path, .. } if path.ends_with("Images")
        ));
    }

    #[test]
    fn test_relocate_moves_file() {
        let temp_dir = setup(&["Images"]);
        let base_path = temp_dir.path();
        let file_path = base_path.join("cat.png");
        fs::write(&file_path, "png").unwrap();

        let op = FileOrganizer::relocate(base_path, &file_path, "Images").expect("move failed");

        assert!(!file_path.exists());
        assert_eq!(op.new_path, base_path.join("Images").join("cat.png"));
        assert_eq!(op.category, "Images");
        assert_eq!(fs::read_to_string(&op.new_path).unwrap(), "png");
    }

    #[test]
    fn test_relocate_refuses_collision() {
        let temp_dir = setup(&["Documents"]);
        let base_path = temp_dir.path();
        let file_path = base_path.join("a.pdf");
        fs::write(&file_path, "new").unwrap();
        fs::write(base_path.join("Documents").join("a.pdf"), "old").unwrap();

        let result = FileOrganizer::relocate(base_path, &file_path, "Documents");
        assert!(matches!(result, Err(MoveError::Collision { .. })));
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new");
        assert_eq!(
            fs::read_to_string(base_path.join("Documents").join("a.pdf")).unwrap(),
            "old"
        );
    }

    #[test]
    fn test_relocate_missing_destination() {
        let temp_dir = setup(&[]);
        let file_path = temp_dir.path().join("a.pdf");
        fs::write(&file_path, "x").unwrap();

        let result = FileOrganizer::relocate(temp_dir.path(), &file_path, "Documents");
        assert!(matches!(result, Err(MoveError::DestinationMissing { .. })));
        assert!(file_path.exists());
    }

    #[test]
    fn test_copy_then_remove_moves_file() {
        let temp_dir = setup(&["Archives"]);
        let from = temp_dir.path().join("big.zip");
        let to = temp_dir.path().join("Archives").join("big.zip");
        fs::write(&from, "data").unwrap();

        FileOrganizer::copy_then_remove(&from, &to).expect("copy failed");

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "data");
    }

    #[test]
    fn test_copy_then_remove_failure_keeps_source_only() {
        let temp_dir = setup(&[]);
        let from = temp_dir.path().join("big.zip");
        let to = temp_dir.path().join("Archives").join("big.zip");
        fs::write(&from, "data").unwrap();

        let result = FileOrganizer::copy_then_remove(&from, &to);

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&from).unwrap(), "data");
        assert!(fs::symlink_metadata(&to).is_err());
    }

    #[test]
    fn test_discard_partial_removes_leftover() {
        let temp_dir = setup(&["Archives"]);
        let partial = temp_dir.path().join("Archives").join("big.zip");
        fs::write(&partial, "trunc").unwrap();

        FileOrganizer::discard_partial(&partial);
        assert!(!partial.exists());

        // Already gone is fine.
        FileOrganizer::discard_partial(&partial);
    }

    #[test]
    fn test_copy_then_remove_keeps_preexisting_destination() {
        let temp_dir = setup(&[]);
        let from = temp_dir.path().join("missing.zip");
        let to = temp_dir.path().join("existing.zip");
        fs::write(&to, "keep").unwrap();

        assert!(FileOrganizer::copy_then_remove(&from, &to).is_err());
        assert_eq!(fs::read_to_string(&to).unwrap(), "keep");
    }

    #[test]
    fn test_relocate_missing_source() {
        let temp_dir = setup(&["Documents"]);
        let file_path = temp_dir.path().join("gone.pdf");

        let result = FileOrganizer::relocate(temp_dir.path(), &file_path, "Documents");
        assert!(matches!(result, Err(MoveError::Io { .. })));
    }

    #[test]
    fn test_history_round_trip_and_delete() {
        let temp_dir = setup(&[]);
        let base_path = temp_dir.path();

        assert!(OperationLog::load(base_path).unwrap().is_none());

        let mut log = OperationLog::new(base_path.to_path_buf());
        log.add_operation(Operation {
            original_path: base_path.join("a.zip"),
            new_path: base_path.join("Archives").join("a.zip"),
            category: "Archives".to_string(),
        });
        log.save(base_path).unwrap();

        let loaded = OperationLog::load(base_path).unwrap().unwrap();
        assert_eq!(loaded.operations, log.operations);
        assert_eq!(loaded.timestamp, log.timestamp);

        OperationLog::delete(base_path).unwrap();
        assert!(!base_path.join(HISTORY_FILE).exists());
    }

    #[test]
    fn test_history_invalid_json() {
        let temp_dir = setup(&[]);
        fs::write(temp_dir.path().join(HISTORY_FILE), "{ not json").unwrap();
        assert!(matches!(
            OperationLog::load(temp_dir.path()),
            Err(HistoryError::InvalidFormat(_))
        ));
    }
}

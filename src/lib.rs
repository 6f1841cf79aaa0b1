//! downtidy - sort a downloads folder into category subfolders
//!
//! This library classifies files by extension, leaves in-progress downloads
//! alone, moves everything else into per-category folders, and keeps an
//! append-only audit log plus a journal for undoing the last pass.

pub mod audit_log;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod relocation;
pub mod transience;
pub mod undo;

pub use audit_log::{AuditLog, FileAuditLog};
pub use classifier::{Classification, MatchRule, SuffixClassifier};
pub use config::{AppConfig, CompiledFilters, ConfigError};
pub use file_category::{CATCH_ALL, Category, CategoryRegistry, ExtensionMap};
pub use file_organizer::{FileOrganizer, HistoryError, MoveError};
pub use relocation::{RelocationEngine, ScanError, ScanOutcome};
pub use transience::TransienceFilter;
pub use undo::{UndoManager, UndoReport};

pub use cli::{CliError, OrganizeCommand, run_cli};

//! The relocation engine.
//!
//! One pass over a directory, non-recursive. Each entry is gated by the
//! exclusion rules and the transience filter, classified by suffix, and
//! moved into its category folder. Per-file failures are logged and the pass
//! continues; only failing to list the directory aborts it.

use crate::audit_log::AuditLog;
use crate::classifier::{MatchRule, SuffixClassifier};
use crate::config::{AppConfig, CompiledFilters, ConfigError};
use crate::file_category::{CATCH_ALL, CategoryRegistry, lowercase_suffixes};
use crate::file_organizer::{FileOrganizer, HISTORY_FILE, OperationLog};
use crate::transience::TransienceFilter;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal errors for a pass.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Cannot read directory {}: {source}", .path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Files moved into a named category.
    pub moved: usize,
    /// Files moved into the catch-all.
    pub others: usize,
    /// Files deliberately left in place.
    pub skipped: usize,
    /// Moves that were attempted and failed.
    pub failed: usize,
}

impl ScanOutcome {
    /// The counts a real pass would produce for this plan, if every move succeeded.
    pub fn projected(plan: &[PlannedEntry]) -> Self {
        let mut outcome = Self::default();
        for entry in plan {
            match &entry.decision {
                Decision::Relocate { catch_all: false, .. } => outcome.moved += 1,
                Decision::Relocate { catch_all: true, .. } => outcome.others += 1,
                Decision::Skip(_) => outcome.skipped += 1,
                Decision::CategoryFolder | Decision::Reserved | Decision::Directory => {}
            }
        }
        outcome
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "moved={}, others={}, skipped={}",
            self.moved, self.others, self.skipped
        )
    }
}

/// Why a file was left in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Not a regular file (socket, fifo, broken link, ...).
    NotAFile,
    /// Matched a configured exclusion rule.
    Excluded,
    /// Still being downloaded.
    Transient { suffixes: Vec<String> },
    /// The directory entry could not be read.
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAFile => write!(f, "not a regular file"),
            SkipReason::Excluded => write!(f, "excluded by filter rules"),
            SkipReason::Transient { suffixes } => {
                write!(f, "temp/in-progress download (suffixes = {:?})", suffixes)
            }
            SkipReason::Unreadable(e) => write!(f, "unreadable entry: {}", e),
        }
    }
}

/// What a pass does with one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// One of our own category folders; ignored silently.
    CategoryFolder,
    /// A log or journal file owned by this tool; ignored silently.
    Reserved,
    /// Some other subdirectory; logged, never descended into.
    Directory,
    Skip(SkipReason),
    Relocate {
        category: String,
        catch_all: bool,
        /// Set when the category came from a rule other than the last suffix.
        rule: Option<MatchRule>,
        suffixes: Vec<String>,
    },
}

/// One directory entry and what to do with it.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    pub name: String,
    pub path: PathBuf,
    pub decision: Decision,
}

/// Classifies and relocates the contents of a directory.
#[derive(Debug, Clone)]
pub struct RelocationEngine {
    registry: CategoryRegistry,
    classifier: SuffixClassifier,
    transience: TransienceFilter,
    filters: CompiledFilters,
    reserved: HashSet<String>,
}

impl RelocationEngine {
    /// Creates an engine. The journal file is always reserved.
    pub fn new(
        registry: CategoryRegistry,
        transience: TransienceFilter,
        filters: CompiledFilters,
    ) -> Self {
        Self {
            classifier: SuffixClassifier::new(&registry),
            registry,
            transience,
            filters,
            reserved: HashSet::from([HISTORY_FILE.to_string()]),
        }
    }

    /// Builds an engine from configuration, reserving the configured log files.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.registry(),
            config.transience_filter(),
            config.compile_filters()?,
        )
        .with_reserved_files([config.log.action_file.clone(), config.log.debug_file.clone()]))
    }

    /// Adds file names the engine must never move.
    pub fn with_reserved_files<I: IntoIterator<Item = String>>(mut self, names: I) -> Self {
        self.reserved.extend(names);
        self
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Decides what to do with one entry, given its name and whether it is a
    /// directory or a regular file.
    pub fn decide(&self, name: &str, is_dir: bool, is_file: bool) -> Decision {
        if is_dir {
            return if self.registry.contains(name) {
                Decision::CategoryFolder
            } else {
                Decision::Directory
            };
        }
        if !is_file {
            return Decision::Skip(SkipReason::NotAFile);
        }
        if self.reserved.contains(name) {
            return Decision::Reserved;
        }
        if !self.filters.should_include(name) {
            return Decision::Skip(SkipReason::Excluded);
        }

        let suffixes = lowercase_suffixes(name);
        if self.transience.is_transient(name) {
            return Decision::Skip(SkipReason::Transient { suffixes });
        }

        match self.classifier.classify(name) {
            Some(classification) => Decision::Relocate {
                category: classification.category.to_string(),
                catch_all: false,
                rule: match classification.rule {
                    MatchRule::LastSuffix => None,
                    rule => Some(rule),
                },
                suffixes,
            },
            None => Decision::Relocate {
                category: CATCH_ALL.to_string(),
                catch_all: true,
                rule: None,
                suffixes,
            },
        }
    }

    /// Lists `dir` and decides every entry, without touching anything.
    ///
    /// Entries are returned sorted by name.
    pub fn plan(&self, dir: &Path) -> Result<Vec<PlannedEntry>, ScanError> {
        let entries = fs::read_dir(dir).map_err(|source| ScanError::Enumeration {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut plan: Vec<PlannedEntry> = entries
            .map(|entry| match entry {
                Ok(entry) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let path = entry.path();
                    // Follow symlinks: a link to a file is moved like a file.
                    let (is_dir, is_file) = match fs::metadata(&path) {
                        Ok(meta) => (meta.is_dir(), meta.is_file()),
                        Err(_) => (false, false),
                    };
                    PlannedEntry {
                        decision: self.decide(&name, is_dir, is_file),
                        name,
                        path,
                    }
                }
                Err(e) => PlannedEntry {
                    name: String::new(),
                    path: dir.to_path_buf(),
                    decision: Decision::Skip(SkipReason::Unreadable(e.to_string())),
                },
            })
            .collect();

        plan.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(plan)
    }

    /// Runs one pass over `dir`, moving files and logging each decision.
    ///
    /// Category folders are created first. A successful pass that moved
    /// anything replaces the relocation journal.
    ///
    /// # Errors
    ///
    /// Only fails if `dir` cannot be listed. Individual move failures are
    /// logged, counted in [`ScanOutcome::failed`], and leave the file in place.
    pub fn run_once(
        &self,
        dir: &Path,
        log: &mut dyn AuditLog,
    ) -> Result<ScanOutcome, ScanError> {
        log.log_debug(&format!("=== Starting run in {} ===", dir.display()));

        let plan = match self.plan(dir) {
            Ok(plan) => plan,
            Err(e) => {
                log.log_debug(&format!("Aborting run: {}", e));
                return Err(e);
            }
        };

        for failure in FileOrganizer::prepare_category_dirs(dir, &self.registry) {
            log.log_debug(&failure.to_string());
        }

        let owned: HashSet<String> = log.owned_files().into_iter().collect();
        let mut outcome = ScanOutcome::default();
        let mut journal = OperationLog::new(dir.to_path_buf());

        for entry in plan {
            let name = &entry.name;
            match entry.decision {
                Decision::CategoryFolder | Decision::Reserved => {}
                Decision::Directory => {
                    log.log_debug(&format!("Skipping directory: {}", name));
                }
                _ if owned.contains(name) => {}
                Decision::Skip(SkipReason::NotAFile) => {
                    log.log_debug(&format!("Skipping non-file: {}", entry.path.display()));
                    outcome.skipped += 1;
                }
                Decision::Skip(reason) => {
                    log.log_debug(&format!("Skipping {}: {}", name, reason));
                    outcome.skipped += 1;
                }
                Decision::Relocate {
                    category,
                    catch_all,
                    rule,
                    suffixes,
                } => {
                    if let Some(rule) = rule {
                        log.log_debug(&format!("Matched by {}: {} -> {}", rule, name, category));
                    }
                    match FileOrganizer::relocate(dir, &entry.path, &category) {
                        Ok(operation) => {
                            if catch_all {
                                log.log_action(&format!(
                                    "Moved: {} -> {} (suffixes = {:?})",
                                    name, category, suffixes
                                ));
                                outcome.others += 1;
                            } else {
                                log.log_action(&format!("Moved: {} -> {}", name, category));
                                outcome.moved += 1;
                            }
                            journal.add_operation(operation);
                        }
                        Err(e) => {
                            log.log_debug(&format!(
                                "Failed to move {} to {}: {}",
                                name, category, e
                            ));
                            outcome.failed += 1;
                        }
                    }
                }
            }
        }

        if !journal.is_empty()
            && let Err(e) = journal.save(dir)
        {
            log.log_debug(&format!("Could not save history: {}", e));
        }

        log.log_debug(&format!("Summary: {}, failed={}", outcome, outcome.failed));
        log.log_debug("=== Finished run ===");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingLog {
        actions: Vec<String>,
        debug: Vec<String>,
    }

    impl AuditLog for RecordingLog {
        fn log_action(&mut self, message: &str) {
            self.actions.push(message.to_string());
        }

        fn log_debug(&mut self, message: &str) {
            self.debug.push(message.to_string());
        }
    }

    fn engine() -> RelocationEngine {
        RelocationEngine::from_config(&AppConfig::default()).unwrap()
    }

    #[test]
    fn test_outcome_display() {
        let outcome = ScanOutcome {
            moved: 3,
            others: 1,
            skipped: 2,
            failed: 5,
        };
        assert_eq!(outcome.to_string(), "moved=3, others=1, skipped=2");
    }

    #[test]
    fn test_decide_directories() {
        let engine = engine();
        assert_eq!(engine.decide("Images", true, false), Decision::CategoryFolder);
        assert_eq!(engine.decide("Others", true, false), Decision::CategoryFolder);
        assert_eq!(engine.decide("projects", true, false), Decision::Directory);
        // Category names match exactly.
        assert_eq!(engine.decide("images", true, false), Decision::Directory);
    }

    #[test]
    fn test_decide_reserved_and_non_files() {
        let engine = engine();
        assert_eq!(engine.decide(HISTORY_FILE, false, true), Decision::Reserved);
        assert_eq!(
            engine.decide("automation_log.txt", false, true),
            Decision::Reserved
        );
        assert_eq!(
            engine.decide("pipe", false, false),
            Decision::Skip(SkipReason::NotAFile)
        );
    }

    #[test]
    fn test_decide_transient_before_classification() {
        let decision = engine().decide("movie.mp4.part", false, true);
        assert!(matches!(
            decision,
            Decision::Skip(SkipReason::Transient { ref suffixes }) if suffixes == &[".mp4", ".part"]
        ));
    }

    #[test]
    fn test_decide_relocate() {
        let engine = engine();
        match engine.decide("Photo.JPG", false, true) {
            Decision::Relocate {
                category,
                catch_all,
                rule,
                ..
            } => {
                assert_eq!(category, "Images");
                assert!(!catch_all);
                assert_eq!(rule, None);
            }
            other => panic!("unexpected decision {:?}", other),
        }

        match engine.decide("notes.xyz123", false, true) {
            Decision::Relocate {
                category,
                catch_all,
                suffixes,
                ..
            } => {
                assert_eq!(category, CATCH_ALL);
                assert!(catch_all);
                assert_eq!(suffixes, vec![".xyz123"]);
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_decide_inner_suffix_rule_recorded() {
        match engine().decide("paper.pdf.old", false, true) {
            Decision::Relocate { category, rule, .. } => {
                assert_eq!(category, "Documents");
                assert_eq!(rule, Some(MatchRule::InnerSuffix(".pdf".to_string())));
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_run_once_counts_and_logs() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("a.png"), "a").unwrap();
        fs::write(dir.join("b.tar.gz"), "b").unwrap();
        fs::write(dir.join("c.xyz123"), "c").unwrap();
        fs::write(dir.join("d.crdownload"), "d").unwrap();
        fs::create_dir(dir.join("stuff")).unwrap();

        let mut log = RecordingLog::default();
        let outcome = engine().run_once(dir, &mut log).unwrap();

        assert_eq!(
            outcome,
            ScanOutcome {
                moved: 2,
                others: 1,
                skipped: 1,
                failed: 0
            }
        );
        assert!(log.actions.contains(&"Moved: a.png -> Images".to_string()));
        assert!(log.actions.contains(&"Moved: b.tar.gz -> Archives".to_string()));
        assert!(
            log.actions
                .contains(&"Moved: c.xyz123 -> Others (suffixes = [\".xyz123\"])".to_string())
        );
        assert!(log.debug.contains(&"Skipping directory: stuff".to_string()));
        assert!(log.debug.iter().any(|l| l.starts_with("Skipping d.crdownload")));
        assert!(
            log.debug
                .contains(&"Summary: moved=2, others=1, skipped=1, failed=0".to_string())
        );

        assert!(dir.join("d.crdownload").exists());
        assert!(dir.join("stuff").is_dir());
        assert!(dir.join(HISTORY_FILE).exists());
    }

    #[test]
    fn test_run_once_collision_not_counted() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::create_dir(dir.join("Documents")).unwrap();
        fs::write(dir.join("Documents").join("a.pdf"), "old").unwrap();
        fs::write(dir.join("a.pdf"), "new").unwrap();

        let mut log = RecordingLog::default();
        let outcome = engine().run_once(dir, &mut log).unwrap();

        assert_eq!(outcome.moved, 0);
        assert_eq!(outcome.failed, 1);
        assert!(log.actions.is_empty());
        assert!(log.debug.iter().any(|l| l.starts_with("Failed to move a.pdf")));
        assert!(!dir.join(HISTORY_FILE).exists());
    }

    #[test]
    fn test_run_once_missing_directory() {
        let mut log = RecordingLog::default();
        let result = engine().run_once(Path::new("/non/existent/dir"), &mut log);
        assert!(matches!(result, Err(ScanError::Enumeration { .. })));
    }

    #[test]
    fn test_run_once_skips_log_owned_files() {
        struct OwningLog(RecordingLog);
        impl AuditLog for OwningLog {
            fn log_action(&mut self, message: &str) {
                self.0.log_action(message);
            }
            fn log_debug(&mut self, message: &str) {
                self.0.log_debug(message);
            }
            fn owned_files(&self) -> Vec<String> {
                vec!["custom.txt".to_string()]
            }
        }

        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("custom.txt"), "log").unwrap();

        let mut log = OwningLog(RecordingLog::default());
        let outcome = engine().run_once(temp_dir.path(), &mut log).unwrap();
        assert_eq!(outcome, ScanOutcome::default());
        assert!(temp_dir.path().join("custom.txt").exists());
    }

    #[test]
    fn test_projected_outcome_matches_plan() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("a.mkv"), "").unwrap();
        fs::write(dir.join("b"), "").unwrap();
        fs::write(dir.join("c.tmp"), "").unwrap();
        fs::create_dir(dir.join("Images")).unwrap();

        let plan = engine().plan(dir).unwrap();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0].name, "Images");

        let outcome = ScanOutcome::projected(&plan);
        assert_eq!(outcome.to_string(), "moved=1, others=1, skipped=1");
        // Planning moves nothing.
        assert!(dir.join("a.mkv").exists());
    }
}

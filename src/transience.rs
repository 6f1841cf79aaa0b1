//! Detection of in-progress downloads.
//!
//! Browsers and download managers write to a temporary name (`.crdownload`,
//! `.part`, ...) and rename on completion. Files carrying one of these markers
//! are left alone until the writer is done with them.

use crate::file_category::lowercase_suffixes;
use std::collections::HashSet;

/// Suffixes marking a file that is still being written.
pub const DEFAULT_TRANSIENT_SUFFIXES: &[&str] = &[".crdownload", ".part", ".tmp", ".partial"];

/// Recognizes transient files by suffix marker.
#[derive(Debug, Clone)]
pub struct TransienceFilter {
    markers: HashSet<String>,
}

impl TransienceFilter {
    /// Creates a filter from a list of markers, with or without leading dots.
    pub fn new<S: AsRef<str>>(markers: &[S]) -> Self {
        Self {
            markers: markers
                .iter()
                .map(|m| {
                    let m = m.as_ref().trim().to_lowercase();
                    if m.starts_with('.') { m } else { format!(".{}", m) }
                })
                .collect(),
        }
    }

    /// Returns true if the last suffix or any other suffix is a marker.
    ///
    /// ```
    /// use downtidy::transience::TransienceFilter;
    ///
    /// let filter = TransienceFilter::default();
    /// assert!(filter.is_transient("setup.exe.crdownload"));
    /// assert!(filter.is_transient("movie.part.mkv"));
    /// assert!(!filter.is_transient("movie.mkv"));
    /// ```
    pub fn is_transient(&self, name: &str) -> bool {
        lowercase_suffixes(name)
            .iter()
            .any(|s| self.markers.contains(s))
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(String::as_str)
    }
}

impl Default for TransienceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSIENT_SUFFIXES)
    }
}

//! Suffix-based classification.
//!
//! The classifier assigns a file name to a category by looking its suffixes
//! up in an [`ExtensionMap`]. Rules are tried in order, first match wins:
//!
//! 1. The last suffix, looked up directly.
//! 2. For multi-suffix names, each suffix left to right.
//! 3. The compound `.tar.gz`, checked on the last two suffixes.
//!
//! No match is not an error; the caller routes the file to the catch-all.

use crate::file_category::{CategoryRegistry, ExtensionMap, lowercase_suffixes};
use std::fmt;

const TAR_GZ: &str = ".tar.gz";
const TAR_GZ_FALLBACK_CATEGORY: &str = "Archives";

/// Which rule produced a classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// The last suffix was registered.
    LastSuffix,
    /// An earlier suffix was registered.
    InnerSuffix(String),
    /// The last two suffixes formed `.tar.gz`.
    CompoundTarGz,
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::LastSuffix => write!(f, "last suffix"),
            MatchRule::InnerSuffix(s) => write!(f, "inner suffix {}", s),
            MatchRule::CompoundTarGz => write!(f, "compound {}", TAR_GZ),
        }
    }
}

/// A successful classification, borrowing the category name from the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<'a> {
    pub category: &'a str,
    pub rule: MatchRule,
}

/// Ordered-rule classifier over a prebuilt extension map.
#[derive(Debug, Clone)]
pub struct SuffixClassifier {
    extensions: ExtensionMap,
    has_archives: bool,
}

impl SuffixClassifier {
    /// Builds a classifier from a registry's reverse index.
    pub fn new(registry: &CategoryRegistry) -> Self {
        Self {
            extensions: registry.build_reverse_index(),
            has_archives: registry.contains(TAR_GZ_FALLBACK_CATEGORY),
        }
    }

    /// Classifies a file name, case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use downtidy::classifier::SuffixClassifier;
    /// use downtidy::file_category::CategoryRegistry;
    ///
    /// let classifier = SuffixClassifier::new(&CategoryRegistry::default());
    /// assert_eq!(classifier.category_of("Photo.JPG"), Some("Images"));
    /// assert_eq!(classifier.category_of("notes.xyz123"), None);
    /// ```
    pub fn classify(&self, name: &str) -> Option<Classification<'_>> {
        let suffixes = lowercase_suffixes(name);
        let last = suffixes.last().map(String::as_str).unwrap_or("");

        if let Some(category) = self.extensions.get(last) {
            return Some(Classification {
                category,
                rule: MatchRule::LastSuffix,
            });
        }

        if suffixes.len() > 1
            && let Some((suffix, category)) = suffixes
                .iter()
                .find_map(|s| self.extensions.get(s).map(|c| (s, c)))
        {
            return Some(Classification {
                category,
                rule: MatchRule::InnerSuffix(suffix.clone()),
            });
        }

        let tail = suffixes[suffixes.len().saturating_sub(2)..].concat();
        if tail != TAR_GZ {
            return None;
        }
        let category = match self.extensions.get(TAR_GZ) {
            Some(category) => category,
            None if self.has_archives => TAR_GZ_FALLBACK_CATEGORY,
            None => return None,
        };
        Some(Classification {
            category,
            rule: MatchRule::CompoundTarGz,
        })
    }

    /// Shorthand returning only the category name.
    pub fn category_of(&self, name: &str) -> Option<&str> {
        self.classify(name).map(|c| c.category)
    }
}

/// Category registry for extension-based file sorting.
///
/// This module holds the table of named categories and the extensions each
/// one claims, and derives the reverse lookup (extension -> category) used
/// by the classifier.
///
/// # Examples
///
/// ```
/// use downtidy::file_category::CategoryRegistry;
///
/// let registry = CategoryRegistry::default();
/// let map = registry.build_reverse_index();
/// assert_eq!(map.get(".jpg"), Some("Images"));
/// assert_eq!(map.get(".tar.gz"), Some("Archives"));
/// assert!(registry.contains("Others"));
/// ```
use std::collections::HashMap;

/// Name of the category that receives files no other category claims.
pub const CATCH_ALL: &str = "Others";

/// A named bucket of extensions sharing one destination folder.
///
/// Extensions are lowercase and carry their leading dot (`.jpg`, `.tar.gz`).
/// An empty extension list marks the catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// The category name, also used as the destination folder name.
    pub name: String,
    /// Extensions claimed by this category.
    pub extensions: Vec<String>,
}

impl Category {
    /// Returns the directory name for this category.
    pub fn dir_name(&self) -> &str {
        &self.name
    }

    /// Returns true if this is the catch-all category.
    pub fn is_catch_all(&self) -> bool {
        self.name == CATCH_ALL
    }
}

/// Ordered set of categories.
///
/// Registration order matters: when two categories claim the same extension,
/// the one registered later owns it in the reverse index.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    /// Creates a registry holding only the catch-all category.
    pub fn new() -> Self {
        Self {
            categories: vec![Category {
                name: CATCH_ALL.to_string(),
                extensions: Vec::new(),
            }],
        }
    }

    /// Creates a registry with the standard download categories.
    pub fn with_default_categories() -> Self {
        let mut registry = Self::new();
        registry.register(
            "Images",
            &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".jfif", ".heic"],
        );
        registry.register(
            "Documents",
            &[".pdf", ".docx", ".txt", ".pptx", ".doc", ".xlsx", ".xls"],
        );
        registry.register("CSV_files", &[".csv"]);
        registry.register("videos", &[".mp4", ".mkv", ".avi"]);
        registry.register(
            "Archives",
            &[".zip", ".rar", ".7z", ".tar", ".gz", ".tar.gz"],
        );
        registry
    }

    /// Adds a category, or replaces the extensions of an existing one.
    ///
    /// Extensions are lowercased and given a leading dot if they lack one.
    /// A replaced category moves to the end of the registration order.
    /// Extensions registered for the catch-all are dropped.
    pub fn register<S: AsRef<str>>(&mut self, name: &str, extensions: &[S]) {
        if name == CATCH_ALL {
            if !extensions.is_empty() {
                tracing::warn!(
                    "Ignoring {} extension(s) registered for catch-all category {}",
                    extensions.len(),
                    CATCH_ALL
                );
            }
            return;
        }

        self.categories.retain(|c| c.name != name);
        self.categories.push(Category {
            name: name.to_string(),
            extensions: extensions
                .iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| e.len() > 1)
                .collect(),
        });
    }

    /// Builds the extension -> category reverse index.
    pub fn build_reverse_index(&self) -> ExtensionMap {
        let mut map = HashMap::new();
        for category in &self.categories {
            for ext in &category.extensions {
                map.insert(ext.clone(), category.name.clone());
            }
        }
        ExtensionMap { map }
    }

    /// Returns true if a category with this exact name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    /// Looks up a category by name.
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Iterates categories in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Returns the number of registered categories, catch-all included.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// A registry always holds the catch-all, so this is never true.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::with_default_categories()
    }
}

/// Read-only reverse index from a single extension to its category name.
#[derive(Debug, Clone, Default)]
pub struct ExtensionMap {
    map: HashMap<String, String>,
}

impl ExtensionMap {
    /// Looks up an extension. The key must be lowercase with its leading dot.
    pub fn get(&self, ext: &str) -> Option<&str> {
        self.map.get(ext).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Lowercases an extension and ensures it starts with a dot.
fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Splits a file name into its ordered suffixes, each with a leading dot.
///
/// Leading dots are not suffix separators, so `.bashrc` has no suffix.
/// A name ending in a dot has no suffixes at all.
///
/// # Examples
///
/// ```
/// use downtidy::file_category::suffixes_of;
///
/// assert_eq!(suffixes_of("x.tar.gz"), vec![".tar", ".gz"]);
/// assert_eq!(suffixes_of("README"), Vec::<String>::new());
/// assert_eq!(suffixes_of(".bashrc"), Vec::<String>::new());
/// ```
pub fn suffixes_of(name: &str) -> Vec<String> {
    if name.ends_with('.') {
        return Vec::new();
    }
    name.trim_start_matches('.')
        .split('.')
        .skip(1)
        .map(|s| format!(".{}", s))
        .collect()
}

/// Like [`suffixes_of`], lowercased for table lookups.
pub fn lowercase_suffixes(name: &str) -> Vec<String> {
    suffixes_of(name)
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect()
}

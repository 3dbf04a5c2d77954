//! File name filtering for change detection.

use std::ffi::OsStr;
use std::sync::Arc;

/// Substring ignore list applied to file names.
///
/// Directories are never filtered; only regular files (and links to them)
/// are checked.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Arc<[String]>,
}

impl IgnoreFilter {
    /// Create a filter from substrings.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Configured substrings.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check if a file name contains any ignore substring.
    #[must_use]
    pub fn is_ignored(&self, file_name: &OsStr) -> bool {
        let name = file_name.to_string_lossy();
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }
}

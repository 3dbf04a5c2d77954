//! Tree scanner computing change signatures.
//!
//! Walks a directory tree with `walkdir` and keeps the newest modification
//! time seen on the root, every subdirectory, and every non-ignored file.
//! The walk is streaming, so memory stays flat regardless of tree size.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::events::{SharedSink, WatchEvent};
use super::filter::IgnoreFilter;
use crate::storage::Signature;

/// How completely a tree was scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// Every entry was read.
    Complete,
    /// Some entries could not be read and were skipped.
    Partial,
    /// Root is missing or not a directory; signature is zero.
    Missing,
}

/// Result of scanning one tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanReport {
    pub signature: Signature,
    pub status: ScanStatus,
    /// Entries whose modification time was considered.
    pub entries: u64,
    /// Entries excluded by the ignore filter or by type.
    pub skipped: u64,
    /// Entries that could not be read.
    pub errors: u64,
}

impl ScanReport {
    fn missing() -> Self {
        Self {
            signature: Signature::ZERO,
            status: ScanStatus::Missing,
            entries: 0,
            skipped: 0,
            errors: 0,
        }
    }
}

/// Computes signatures for watch paths.
#[derive(Clone)]
pub struct ChangeDetector {
    filter: IgnoreFilter,
    events: SharedSink,
}

impl std::fmt::Debug for ChangeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDetector")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl ChangeDetector {
    /// Create a detector with the given ignore filter.
    #[must_use]
    pub fn new(filter: IgnoreFilter, events: SharedSink) -> Self {
        Self { filter, events }
    }

    /// Scan `root` and return its signature. Never fails.
    #[must_use]
    pub fn scan(&self, root: &Path) -> ScanReport {
        let report = self.walk(root);

        if report.status == ScanStatus::Missing {
            self.events.emit(&WatchEvent::PathMissing {
                path: root.display().to_string(),
            });
        } else {
            self.events.emit(&WatchEvent::ScanCompleted {
                path: root.display().to_string(),
                signature: report.signature,
                entries: report.entries,
                skipped: report.skipped,
                errors: report.errors,
            });
        }

        report
    }

    /// Scan on the blocking thread pool.
    pub async fn scan_async(&self, root: PathBuf) -> ScanReport {
        let detector = self.clone();
        let shown = root.display().to_string();

        match tokio::task::spawn_blocking(move || detector.scan(&root)).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(path = %shown, error = %e, "Scan task failed");
                ScanReport {
                    status: ScanStatus::Partial,
                    errors: 1,
                    ..ScanReport::missing()
                }
            }
        }
    }

    fn walk(&self, root: &Path) -> ScanReport {
        // Follows a symlinked root, such as a mount point linked into place.
        let root_meta = match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => meta,
            _ => return ScanReport::missing(),
        };

        let mut signature = Signature::ZERO;
        let mut entries = 0u64;
        let mut skipped = 0u64;
        let mut errors = 0u64;

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::trace!(error = %e, "Skipping unreadable entry");
                    errors += 1;
                    continue;
                }
            };

            let file_type = entry.file_type();
            let metadata = if entry.depth() == 0 {
                // The root always counts, whatever its name.
                Ok(root_meta.clone())
            } else if file_type.is_dir() {
                entry.metadata().map_err(std::io::Error::from)
            } else if self.filter.is_ignored(entry.file_name()) {
                skipped += 1;
                continue;
            } else if file_type.is_file() {
                entry.metadata().map_err(std::io::Error::from)
            } else if file_type.is_symlink() {
                // Links count only when they resolve to a regular file.
                match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => Ok(meta),
                    Ok(_) => {
                        skipped += 1;
                        continue;
                    }
                    Err(e) => Err(e),
                }
            } else {
                skipped += 1;
                continue;
            };

            match metadata.and_then(|m| m.modified()) {
                Ok(modified) => {
                    entries += 1;
                    signature = signature.max(Signature::from_system_time(modified));
                }
                Err(e) => {
                    tracing::trace!(path = %entry.path().display(), error = %e, "Skipping entry");
                    errors += 1;
                }
            }
        }

        ScanReport {
            signature,
            status: if errors == 0 {
                ScanStatus::Complete
            } else {
                ScanStatus::Partial
            },
            entries,
            skipped,
            errors,
        }
    }
}

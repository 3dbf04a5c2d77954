//! Watch path to library section resolution.

use std::collections::BTreeMap;

use super::events::{SharedSink, WatchEvent};
use crate::config::WatchPath;
use crate::remote::{LibraryService, LibrarySection};
use crate::Result;

/// The library a watch path belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryTarget {
    /// Section key.
    pub id: String,
    /// Title reported by the server.
    pub title: String,
}

/// Resolved watch paths, keyed by configured path.
pub type LibraryMapping = BTreeMap<String, LibraryTarget>;

/// Matches configured watch paths against section locations.
///
/// Only exact string equality counts. Paths are never normalized or
/// matched by prefix, so `/media/movies/` does not match `/media/movies`.
pub struct PathResolver<'a> {
    watch_paths: &'a [WatchPath],
    events: SharedSink,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver for the configured paths.
    #[must_use]
    pub fn new(watch_paths: &'a [WatchPath], events: SharedSink) -> Self {
        Self {
            watch_paths,
            events,
        }
    }

    /// Fetch the section listing and resolve against it.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    pub async fn fetch_and_resolve<S: LibraryService>(
        &self,
        service: &S,
    ) -> Result<LibraryMapping> {
        let sections = service.list_sections().await?;
        Ok(self.resolve(&sections))
    }

    /// Build the mapping from a section listing.
    ///
    /// When two sections declare the same location the later one wins.
    /// Unmatched watch paths are reported and left out.
    #[must_use]
    pub fn resolve(&self, sections: &[LibrarySection]) -> LibraryMapping {
        let mut mapping = LibraryMapping::new();

        for section in sections {
            for location in &section.locations {
                let Some(watch) = self.watch_paths.iter().find(|w| &w.path == location) else {
                    continue;
                };
                self.events.emit(&WatchEvent::LibraryResolved {
                    path: watch.path.clone(),
                    id: section.id.clone(),
                    title: section.title.clone(),
                });
                if section.title != watch.expected_title {
                    self.events.emit(&WatchEvent::TitleMismatch {
                        path: watch.path.clone(),
                        expected: watch.expected_title.clone(),
                        actual: section.title.clone(),
                    });
                }

                let replaced = mapping.insert(
                    watch.path.clone(),
                    LibraryTarget {
                        id: section.id.clone(),
                        title: section.title.clone(),
                    },
                );
                if let Some(earlier) = replaced {
                    tracing::debug!(
                        path = %watch.path,
                        earlier = %earlier.id,
                        id = %section.id,
                        "Location also declared by a later section"
                    );
                }
            }
        }

        for watch in self.watch_paths {
            if !mapping.contains_key(&watch.path) {
                self.events.emit(&WatchEvent::ResolutionSkipped {
                    path: watch.path.clone(),
                    expected_title: watch.expected_title.clone(),
                });
            }
        }

        mapping
    }
}

//! Semantic watch events and the sinks that receive them.
//!
//! Components never format log lines themselves. They emit a `WatchEvent`
//! through an injected `EventSink`; `TracingSink` turns events into
//! structured `tracing` records and `RecordingSink` keeps them for tests.

#![allow(clippy::missing_const_for_fn)]

use std::sync::Arc;

use parking_lot::Mutex;

use crate::storage::Signature;

/// Something worth telling the operator about.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// A watch path was matched to a library section.
    LibraryResolved {
        path: String,
        id: String,
        title: String,
    },
    /// A path matched a section whose title differs from the configured one.
    TitleMismatch {
        path: String,
        expected: String,
        actual: String,
    },
    /// A watch path matched no library location and will not be monitored.
    ResolutionSkipped { path: String, expected_title: String },
    /// A watch path does not exist or is not a directory.
    PathMissing { path: String },
    /// A tree was scanned.
    ScanCompleted {
        path: String,
        signature: Signature,
        entries: u64,
        skipped: u64,
        errors: u64,
    },
    /// A tree's signature moved past its stored baseline.
    ChangeDetected {
        path: String,
        previous: Signature,
        current: Signature,
    },
    /// The server accepted a refresh request.
    TriggerSucceeded { id: String, title: String },
    /// A refresh request failed; no retry this cycle.
    TriggerFailed {
        id: String,
        title: String,
        error: String,
    },
    /// Persisted state was read at startup.
    StateLoaded { file: String, entries: usize },
    /// Persisted state could not be read; starting without history.
    StateLoadFailed { file: String, error: String },
    /// Persisted state could not be written; in-memory baseline kept.
    StateSaveFailed { file: String, error: String },
    /// One scan/trigger/persist pass finished.
    CycleCompleted {
        cycle: u64,
        scanned: usize,
        changed: usize,
        triggered: usize,
        failed: usize,
        persisted: bool,
    },
}

impl WatchEvent {
    /// Short stable name, used as the `event` field in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LibraryResolved { .. } => "library_resolved",
            Self::TitleMismatch { .. } => "title_mismatch",
            Self::ResolutionSkipped { .. } => "resolution_skipped",
            Self::PathMissing { .. } => "path_missing",
            Self::ScanCompleted { .. } => "scan_completed",
            Self::ChangeDetected { .. } => "change_detected",
            Self::TriggerSucceeded { .. } => "trigger_succeeded",
            Self::TriggerFailed { .. } => "trigger_failed",
            Self::StateLoaded { .. } => "state_loaded",
            Self::StateLoadFailed { .. } => "state_load_failed",
            Self::StateSaveFailed { .. } => "state_save_failed",
            Self::CycleCompleted { .. } => "cycle_completed",
        }
    }
}

/// Receiver for watch events.
pub trait EventSink: Send + Sync {
    /// Handle one event.
    fn emit(&self, event: &WatchEvent);
}

/// Shared handle passed to every component.
pub type SharedSink = Arc<dyn EventSink>;

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    /// Create a shared tracing sink.
    #[must_use]
    pub fn shared() -> SharedSink {
        Arc::new(Self)
    }
}

impl EventSink for TracingSink {
    fn emit(&self, event: &WatchEvent) {
        let name = event.name();
        match event {
            WatchEvent::LibraryResolved { path, id, title } => {
                tracing::info!(event = name, %path, %id, %title, "Found library for watch path");
            }
            WatchEvent::TitleMismatch {
                path,
                expected,
                actual,
            } => {
                tracing::warn!(
                    event = name,
                    %path,
                    %expected,
                    %actual,
                    "Library title differs from configured title"
                );
            }
            WatchEvent::ResolutionSkipped {
                path,
                expected_title,
            } => {
                tracing::warn!(
                    event = name,
                    %path,
                    %expected_title,
                    "No library location matches watch path, not monitoring it"
                );
            }
            WatchEvent::PathMissing { path } => {
                tracing::warn!(event = name, %path, "Path does not exist");
            }
            WatchEvent::ScanCompleted {
                path,
                signature,
                entries,
                skipped,
                errors,
            } => {
                tracing::debug!(
                    event = name,
                    %path,
                    %signature,
                    entries,
                    skipped,
                    errors,
                    "Scan complete"
                );
            }
            WatchEvent::ChangeDetected {
                path,
                previous,
                current,
            } => {
                tracing::info!(event = name, %path, %previous, %current, "Changes detected");
            }
            WatchEvent::TriggerSucceeded { id, title } => {
                tracing::info!(event = name, %id, %title, "Updated library");
            }
            WatchEvent::TriggerFailed { id, title, error } => {
                tracing::error!(event = name, %id, %title, %error, "Failed to update library");
            }
            WatchEvent::StateLoaded { file, entries } => {
                tracing::info!(event = name, %file, entries, "Loaded previous state");
            }
            WatchEvent::StateLoadFailed { file, error } => {
                tracing::warn!(event = name, %file, %error, "Could not load state file");
            }
            WatchEvent::StateSaveFailed { file, error } => {
                tracing::error!(event = name, %file, %error, "Error saving state");
            }
            WatchEvent::CycleCompleted {
                cycle,
                scanned,
                changed,
                triggered,
                failed,
                persisted,
            } => {
                tracing::debug!(
                    event = name,
                    cycle,
                    scanned,
                    changed,
                    triggered,
                    failed,
                    persisted,
                    "Poll cycle complete"
                );
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WatchEvent>>,
}

impl RecordingSink {
    /// Create a new recording sink.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Copy of all events so far.
    #[must_use]
    pub fn events(&self) -> Vec<WatchEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events with the given name.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| e.name() == name).count()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &WatchEvent) {
        self.events.lock().push(event.clone());
    }
}

//! Poll-based change detection and library refresh.
//!
//! This module provides:
//! - Tree signatures computed with `walkdir` (`ChangeDetector`)
//! - Watch path to library resolution (`PathResolver`)
//! - Refresh requests (`UpdateTrigger`)
//! - The poll loop tying them together (`Scheduler`)
//! - Structured watch events (`EventSink`)

mod events;
mod filter;
mod resolver;
mod scanner;
mod scheduler;
mod trigger;

#[cfg(test)]
pub(crate) mod fake;

pub use events::{EventSink, RecordingSink, SharedSink, TracingSink, WatchEvent};
pub use filter::IgnoreFilter;
pub use resolver::{LibraryMapping, LibraryTarget, PathResolver};
pub use scanner::{ChangeDetector, ScanReport, ScanStatus};
pub use scheduler::{CycleReport, Phase, Scheduler};
pub use trigger::UpdateTrigger;

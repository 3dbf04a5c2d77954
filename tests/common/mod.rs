//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use filetime::{set_file_mtime, FileTime};
use parking_lot::Mutex;
use plexwatch::error::RemoteError;
use plexwatch::remote::{LibraryService, LibrarySection};
use plexwatch::Result;

/// Scriptable stand-in for a Plex server.
#[derive(Default)]
pub struct FakePlex {
    pub sections: Vec<LibrarySection>,
    pub listing_fails: AtomicBool,
    pub failing_ids: Mutex<HashSet<String>>,
    pub refreshed: Mutex<Vec<String>>,
}

impl FakePlex {
    pub fn new(sections: Vec<LibrarySection>) -> Self {
        Self {
            sections,
            ..Self::default()
        }
    }

    pub fn refreshed(&self) -> Vec<String> {
        self.refreshed.lock().clone()
    }

    pub fn fail_refresh(&self, id: &str) {
        self.failing_ids.lock().insert(id.to_string());
    }
}

impl LibraryService for FakePlex {
    fn endpoint(&self) -> &str {
        "http://fake-plex:32400"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_sections(&self) -> Result<Vec<LibrarySection>> {
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                endpoint: "/library/sections".to_string(),
                status: 401,
            }
            .into());
        }
        Ok(self.sections.clone())
    }

    async fn refresh_section(&self, id: &str) -> Result<()> {
        if self.failing_ids.lock().contains(id) {
            return Err(RemoteError::transport(
                format!("/library/sections/{id}/refresh"),
                "connection reset",
            )
            .into());
        }
        self.refreshed.lock().push(id.to_string());
        Ok(())
    }
}

pub fn set_mtime(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

pub fn set_mtime_nanos(path: &Path, secs: i64, nanos: u32) {
    set_file_mtime(path, FileTime::from_unix_time(secs, nanos)).unwrap();
}

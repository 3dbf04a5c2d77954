//! In-memory `LibraryService` for unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::RemoteError;
use crate::remote::{LibraryService, LibrarySection};
use crate::Result;

#[derive(Default)]
pub struct FakeLibrary {
    pub sections: Vec<LibrarySection>,
    pub unreachable: AtomicBool,
    pub failing_ids: Mutex<HashSet<String>>,
    pub refreshed: Mutex<Vec<String>>,
    pub listings: AtomicUsize,
}

impl FakeLibrary {
    pub fn with_sections(sections: Vec<LibrarySection>) -> Self {
        Self {
            sections,
            ..Self::default()
        }
    }

    pub fn fail_refresh(&self, id: &str, fail: bool) {
        let mut ids = self.failing_ids.lock();
        if fail {
            ids.insert(id.to_string());
        } else {
            ids.remove(id);
        }
    }

    pub fn refreshed(&self) -> Vec<String> {
        self.refreshed.lock().clone()
    }

    fn check_reachable(&self, endpoint: &str) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RemoteError::transport(endpoint, "connection refused").into());
        }
        Ok(())
    }
}

impl LibraryService for FakeLibrary {
    fn endpoint(&self) -> &str {
        "http://fake:32400"
    }

    async fn ping(&self) -> Result<()> {
        self.check_reachable("/")
    }

    async fn list_sections(&self) -> Result<Vec<LibrarySection>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        self.check_reachable("/library/sections")?;
        Ok(self.sections.clone())
    }

    async fn refresh_section(&self, id: &str) -> Result<()> {
        let endpoint = format!("/library/sections/{id}/refresh");
        self.check_reachable(&endpoint)?;
        if self.failing_ids.lock().contains(id) {
            return Err(RemoteError::Status {
                endpoint,
                status: 500,
            }
            .into());
        }
        self.refreshed.lock().push(id.to_string());
        Ok(())
    }
}

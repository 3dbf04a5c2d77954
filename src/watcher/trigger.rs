//! Library refresh requests.

use std::sync::Arc;

use super::events::{SharedSink, WatchEvent};
use super::resolver::LibraryTarget;
use crate::metrics::TRIGGERS_TOTAL;
use crate::remote::LibraryService;
use crate::Result;

/// Asks the server to rescan a library. One attempt per call.
pub struct UpdateTrigger<S> {
    service: Arc<S>,
    events: SharedSink,
}

impl<S: LibraryService> UpdateTrigger<S> {
    /// Create a trigger backed by `service`.
    #[must_use]
    pub fn new(service: Arc<S>, events: SharedSink) -> Self {
        Self { service, events }
    }

    /// Request a rescan of `target`.
    ///
    /// The outcome is reported as an event either way.
    ///
    /// # Errors
    ///
    /// Returns the remote error if the request failed.
    pub async fn trigger(&self, target: &LibraryTarget) -> Result<()> {
        match self.service.refresh_section(&target.id).await {
            Ok(()) => {
                TRIGGERS_TOTAL.with_label_values(&["success"]).inc();
                self.events.emit(&WatchEvent::TriggerSucceeded {
                    id: target.id.clone(),
                    title: target.title.clone(),
                });
                Ok(())
            }
            Err(e) => {
                TRIGGERS_TOTAL.with_label_values(&["failure"]).inc();
                self.events.emit(&WatchEvent::TriggerFailed {
                    id: target.id.clone(),
                    title: target.title.clone(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

//! Media server access.
//!
//! `LibraryService` is the seam between the poll loop and the server;
//! `PlexClient` is the production implementation.

use std::future::Future;

mod client;
mod sections;

pub use client::{PlexClient, TOKEN_HEADER};
pub use sections::{parse_sections, LibrarySection};

use crate::Result;

/// Operations the watcher needs from the media server.
pub trait LibraryService: Send + Sync {
    /// Address shown in logs and error messages.
    fn endpoint(&self) -> &str;

    /// Check the server answers authenticated requests.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;

    /// Fetch every library section with its storage locations.
    fn list_sections(&self) -> impl Future<Output = Result<Vec<LibrarySection>>> + Send;

    /// Ask the server to rescan one section.
    fn refresh_section(&self, id: &str) -> impl Future<Output = Result<()>> + Send;
}

//! Startup sequence: validate, check connectivity, resolve, load state.

use std::path::Path;
use std::sync::Arc;

use crate::error::ResolutionError;
use crate::remote::LibraryService;
use crate::storage::StateStore;
use crate::watcher::{PathResolver, Scheduler, SharedSink, WatchEvent};
use crate::{Config, Result};

/// Build a ready-to-run scheduler.
///
/// Fails before any cycle runs when the configuration is invalid, the
/// server cannot be reached, or no watch path maps to a library. Missing
/// watch directories are only warned about.
///
/// # Errors
///
/// Returns `Error::Config` or `Error::Resolution`.
pub async fn bootstrap<S: LibraryService>(
    config: &Config,
    service: Arc<S>,
    events: SharedSink,
) -> Result<Scheduler<S>> {
    config.validate()?;

    for watch in &config.watch_paths {
        if !Path::new(&watch.path).exists() {
            events.emit(&WatchEvent::PathMissing {
                path: watch.path.clone(),
            });
        }
    }

    let unreachable = |e: crate::Error| ResolutionError::Unreachable {
        url: service.endpoint().to_string(),
        reason: e.to_string(),
    };

    service.ping().await.map_err(unreachable)?;

    let mapping = PathResolver::new(&config.watch_paths, Arc::clone(&events))
        .fetch_and_resolve(service.as_ref())
        .await
        .map_err(unreachable)?;

    if mapping.is_empty() {
        let configured = config
            .watch_paths
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ResolutionError::NoMatches { configured }.into());
    }

    tracing::info!(libraries = mapping.len(), "Resolved watch paths");

    let store = StateStore::new(&config.state_file, Arc::clone(&events));
    let baseline = store.load();

    Ok(Scheduler::new(config, mapping, service, store, baseline, events))
}

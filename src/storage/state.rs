//! JSON state file holding the last signature per watch path.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::models::PersistedState;
use crate::error::PersistenceError;
use crate::watcher::{SharedSink, WatchEvent};
use crate::Result;

/// Loads and saves `PersistedState` to a single file.
///
/// The file is read once at startup and overwritten wholesale after every
/// completed cycle. There is exactly one writer, so no locking is done.
pub struct StateStore {
    path: PathBuf,
    events: SharedSink,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").field("path", &self.path).finish()
    }
}

impl StateStore {
    /// Create a store backed by `path`. Nothing is touched on disk yet.
    pub fn new(path: impl Into<PathBuf>, events: SharedSink) -> Self {
        Self {
            path: path.into(),
            events,
        }
    }

    /// Backing file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state, falling back to empty history.
    ///
    /// A missing file is normal on first run. An unreadable or corrupt file
    /// is reported and treated the same way.
    #[must_use]
    pub fn load(&self) -> PersistedState {
        match self.try_load() {
            Ok(Some(state)) => {
                self.events.emit(&WatchEvent::StateLoaded {
                    file: self.display(),
                    entries: state.len(),
                });
                state
            }
            Ok(None) => {
                tracing::debug!(file = %self.path.display(), "No state file, starting fresh");
                PersistedState::new()
            }
            Err(e) => {
                self.events.emit(&WatchEvent::StateLoadFailed {
                    file: self.display(),
                    error: e.to_string(),
                });
                PersistedState::new()
            }
        }
    }

    /// Load the persisted state, reporting why it could not be read.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn try_load(&self) -> Result<Option<PersistedState>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PersistenceError::Read {
                    path: self.display(),
                    reason: e.to_string(),
                }
                .into())
            }
        };

        let state = serde_json::from_str(&contents).map_err(|e| PersistenceError::Parse {
            path: self.display(),
            reason: e.to_string(),
        })?;

        Ok(Some(state))
    }

    /// Replace the persisted state with `state`.
    ///
    /// Writes to a sibling temporary file and renames it over the target, so
    /// a crash mid-write leaves the previous state intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        self.write_atomic(state).map_err(|e| {
            PersistenceError::Write {
                path: self.display(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn write_atomic(&self, state: &PersistedState) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(state).map_err(io::Error::other)?;

        let tmp = self.tmp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        tracing::trace!(file = %self.path.display(), entries = state.len(), "State saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

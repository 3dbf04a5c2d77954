//! Error types and Result aliases for plexwatch.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All fallible public functions return `Result<T, Error>` or `Result<T>`.
//! Whether a given error is fatal is decided by the caller: startup treats
//! configuration and resolution errors as fatal, the poll loop logs
//! everything else and keeps going.

use thiserror::Error;

/// Result type alias using plexwatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for plexwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Startup could not map any watch path to a library.
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Remote service call failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// State file could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Startup resolution errors. Both are fatal.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// Server could not be reached or refused the listing.
    #[error("cannot reach media server at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// No configured path matched a library location.
    #[error("no configured path matches a library location (configured: {configured})")]
    NoMatches { configured: String },
}

/// Remote service errors.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// Server answered with a non-success status.
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    /// Response body could not be parsed.
    #[error("malformed response: {0}")]
    Parse(String),
}

/// State file errors.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// State file exists but cannot be read.
    #[error("failed to read state file '{path}': {reason}")]
    Read { path: String, reason: String },

    /// State file contents are not a valid state map.
    #[error("failed to parse state file '{path}': {reason}")]
    Parse { path: String, reason: String },

    /// State file could not be written.
    #[error("failed to write state file '{path}': {reason}")]
    Write { path: String, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error should stop the process at startup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Resolution(_))
    }
}

impl RemoteError {
    /// Create a transport error for an endpoint.
    pub fn transport(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }
}

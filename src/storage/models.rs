//! Data models for persisted watch state.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most recent modification time seen anywhere in a tree, in fractional
/// epoch seconds.
///
/// `0.0` means "nothing observed": the tree is missing, unreadable, or has
/// never been scanned.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(f64);

impl Signature {
    /// Signature of a missing or unscanned tree.
    pub const ZERO: Self = Self(0.0);

    /// Create a signature from raw epoch seconds.
    #[must_use]
    pub const fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// Convert a filesystem timestamp. Times before the epoch map to zero.
    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Self {
        time.duration_since(UNIX_EPOCH)
            .map_or(Self::ZERO, |d| Self(d.as_secs_f64()))
    }

    /// Raw epoch seconds.
    #[must_use]
    pub const fn as_secs(self) -> f64 {
        self.0
    }

    /// Whether anything was observed.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 <= 0.0
    }

    /// Keep the later of two signatures.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if other > self {
            other
        } else {
            self
        }
    }

    /// UTC wall-clock form, for logs.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if self.is_zero() {
            return None;
        }
        let secs = self.0.trunc() as i64;
        let nanos = ((self.0 - self.0.trunc()) * 1e9) as u32;
        DateTime::from_timestamp(secs, nanos)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "never"),
        }
    }
}

/// Last-known signature per watch path, keyed by the configured path string.
pub type PersistedState = BTreeMap<String, Signature>;

//! Persistent watch state.
//!
//! This module provides:
//! - `Signature`, the per-tree change marker
//! - `StateStore`, the JSON file that carries signatures across restarts

mod models;
mod state;

pub use models::{PersistedState, Signature};
pub use state::StateStore;

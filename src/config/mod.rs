//! Configuration management for plexwatch.
//!
//! Values come from command-line arguments with environment variable
//! fallbacks (parsed in `main.rs`). The resulting `Config` is built once and
//! passed by reference to the components that need it.

mod settings;

pub use settings::{AdvancePolicy, Config, WatchPath, DEFAULT_IGNORE_PATTERNS};

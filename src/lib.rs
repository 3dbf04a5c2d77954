//! plexwatch library
//!
//! Poll-based directory monitor that asks a Plex Media Server to rescan a
//! library whenever one of its watched directory trees changes. Built for
//! storage where the server's own change notifications do not fire, such as
//! NFS and SMB mounts.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod observability;
pub mod remote;
pub mod server;
pub mod startup;
pub mod storage;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};

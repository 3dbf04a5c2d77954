//! Structured logging setup.
//!
//! Provides setup for observability using the `tracing` crate with:
//! - Console output, plain text or JSON
//! - Optional log file written through a non-blocking appender
//! - Log level from `RUST_LOG`, falling back to the configured level

use std::ffi::OsStr;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

use crate::{Error, Result};

type Subscriber = tracing_subscriber::layer::Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Subscriber> + Send + Sync>;

/// Tracing configuration options.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON output format
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn fmt_layer<W>(writer: W, json: bool, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

/// Open `path` for appending without rotation.
///
/// # Errors
///
/// Returns `Error::Config` if the file or its directory cannot be created.
fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .unwrap_or_else(|| OsStr::new("plexwatch.log"))
        .to_string_lossy()
        .into_owned();

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .map_err(|e| Error::config(format!("cannot open log file {}: {e}", path.display())))
}

/// Initialize tracing.
///
/// When `log_file` is set, every record is also appended to that file. The
/// returned guard flushes the file writer on drop and must be kept alive
/// for the life of the process.
///
/// # Errors
///
/// Returns `Error::Config` if the log file cannot be opened, or an error if a
/// global subscriber is already installed.
pub fn init_tracing(
    config: &TracingConfig,
    log_file: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(std::io::stdout, config.json, true)];

    let guard = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            layers.push(fmt_layer(writer, config.json, false));
            Some(guard)
        }
        None => None,
    };

    Registry::default()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| Error::internal(format!("failed to initialize tracing: {e}")))?;

    tracing::debug!(
        level = %config.level,
        json = config.json,
        log_file = ?log_file,
        "Tracing initialized"
    );

    Ok(guard)
}

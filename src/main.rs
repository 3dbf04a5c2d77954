//! plexwatch - Plex library update monitor
//!
//! Entry point for the polling daemon.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use plexwatch::config::{AdvancePolicy, WatchPath, DEFAULT_IGNORE_PATTERNS};
use plexwatch::metrics::init_metrics;
use plexwatch::observability::{init_tracing, TracingConfig};
use plexwatch::remote::PlexClient;
use plexwatch::server::{shutdown_signal, spawn_metrics_server, ServerState};
use plexwatch::watcher::TracingSink;
use plexwatch::{startup, Config, Result};

/// plexwatch - trigger Plex library scans when watched directories change
#[derive(Parser, Debug)]
#[command(name = "plexwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Plex server base address
    #[arg(long, env = "PLEXWATCH_SERVER_URL", default_value = "http://localhost:32400")]
    server_url: String,

    /// Plex authentication token (X-Plex-Token)
    #[arg(long, env = "PLEXWATCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Seconds between checks
    #[arg(short, long, env = "PLEXWATCH_INTERVAL", default_value = "60")]
    interval: u64,

    /// Directory to watch and the library it belongs to, as PATH=TITLE (repeatable)
    #[arg(short, long)]
    watch: Vec<String>,

    /// PATH=TITLE entries separated by ';', usually set through the environment
    #[arg(long, env = "PLEXWATCH_WATCH", value_delimiter = ';', hide = true)]
    watch_list: Vec<String>,

    /// File name substrings to ignore
    #[arg(
        long,
        env = "PLEXWATCH_IGNORE",
        value_delimiter = ',',
        default_values_t = DEFAULT_IGNORE_PATTERNS.iter().map(|p| (*p).to_string())
    )]
    ignore: Vec<String>,

    /// File holding signatures between runs
    #[arg(long, env = "PLEXWATCH_STATE_FILE", default_value = "/tmp/plexwatch_state.json")]
    state_file: PathBuf,

    /// Also write logs to this file
    #[arg(long, env = "PLEXWATCH_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PLEXWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "PLEXWATCH_LOG_JSON")]
    log_json: bool,

    /// Seconds before a Plex request is abandoned
    #[arg(long, env = "PLEXWATCH_REQUEST_TIMEOUT", default_value = "30")]
    request_timeout: u64,

    /// Keep re-detecting a change until its library refresh succeeds
    #[arg(long, env = "PLEXWATCH_RETRY_FAILED_TRIGGERS")]
    retry_failed_triggers: bool,

    /// Serve /health and /metrics on this address
    #[arg(long, env = "PLEXWATCH_METRICS_ADDR")]
    metrics_addr: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let watch_paths = self
            .watch
            .iter()
            .chain(self.watch_list.iter().filter(|w| !w.trim().is_empty()))
            .map(|w| w.parse::<WatchPath>())
            .collect::<Result<Vec<_>>>()?;

        Ok(Config {
            server_url: self.server_url,
            token: self.token,
            interval_secs: self.interval,
            watch_paths,
            ignore_patterns: self.ignore,
            state_file: self.state_file,
            log_file: self.log_file,
            log_level: self.log_level,
            log_json: self.log_json,
            request_timeout_secs: self.request_timeout,
            advance_policy: if self.retry_failed_triggers {
                AdvancePolicy::OnSuccess
            } else {
                AdvancePolicy::Always
            },
            metrics_addr: self.metrics_addr,
        })
    }
}

async fn run(config: Config) -> Result<()> {
    init_metrics();

    let service = Arc::new(PlexClient::new(&config)?);
    let mut scheduler = startup::bootstrap(&config, service, TracingSink::shared()).await?;

    let _metrics = match &config.metrics_addr {
        Some(addr) => {
            Some(spawn_metrics_server(addr, ServerState::for_interval(config.interval())).await?)
        }
        None => None,
    };

    scheduler.run(shutdown_signal()).await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = TracingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    };
    let _guard = match init_tracing(&tracing_config, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("plexwatch: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("plexwatch v{} started", env!("CARGO_PKG_VERSION"));

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!(?config, "Configuration loaded");

    match run(config).await {
        Ok(()) => {
            tracing::info!("plexwatch stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "plexwatch cannot start");
            ExitCode::FAILURE
        }
    }
}

//! Health and metrics endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;

use crate::metrics::{CYCLES_TOTAL, LAST_CYCLE_TIMESTAMP, LIBRARIES_WATCHED};

/// Shared state for the HTTP endpoints.
#[derive(Debug, Clone)]
pub struct ServerState {
    /// A cycle older than this marks the process unhealthy.
    pub stale_after: Duration,
}

impl ServerState {
    /// Allow two missed intervals plus slack for slow scans.
    #[must_use]
    pub fn for_interval(interval: Duration) -> Self {
        Self {
            stale_after: interval * 2 + Duration::from_secs(60),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub libraries: i64,
    pub cycles: u64,
    pub last_cycle: Option<i64>,
}

/// Create the health and metrics router.
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Health check endpoint.
///
/// Healthy until the first cycle completes, then healthy as long as cycles
/// keep completing.
async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let cycles = CYCLES_TOTAL.get();
    let last = LAST_CYCLE_TIMESTAMP.get();
    let last_cycle = (cycles > 0).then_some(last);

    let age = chrono::Utc::now().timestamp().saturating_sub(last);
    let stale = last_cycle.is_some()
        && u64::try_from(age).unwrap_or(0) > state.stale_after.as_secs();

    let response = HealthResponse {
        status: if stale { "stale" } else { "healthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        libraries: LIBRARIES_WATCHED.get(),
        cycles,
        last_cycle,
    };

    let status_code = if stale {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    tracing::debug!(status = ?status_code, cycles, "Health check");

    (status_code, Json(response))
}

/// Prometheus metrics endpoint.
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; charset=utf-8",
            )],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(
                    axum::http::header::CONTENT_TYPE,
                    "text/plain; charset=utf-8",
                )],
                b"Failed to encode metrics".to_vec(),
            )
        }
    }
}

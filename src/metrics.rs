//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Completed poll cycles.
pub static CYCLES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("plexwatch_cycles_total", "Total number of completed poll cycles")
        .unwrap()
});

/// Watch paths whose signature moved forward.
pub static CHANGES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "plexwatch_changes_total",
        "Total number of detected watch path changes"
    )
    .unwrap()
});

/// Refresh requests by outcome.
pub static TRIGGERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "plexwatch_triggers_total",
        "Total number of library refresh requests",
        &["outcome"]
    )
    .unwrap()
});

/// Failed state file writes.
pub static STATE_SAVE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "plexwatch_state_save_failures_total",
        "Total number of failed state file writes"
    )
    .unwrap()
});

/// Libraries being monitored.
pub static LIBRARIES_WATCHED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "plexwatch_libraries_watched",
        "Number of watch paths mapped to a library"
    )
    .unwrap()
});

/// Unix time of the last completed cycle.
pub static LAST_CYCLE_TIMESTAMP: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "plexwatch_last_cycle_timestamp_seconds",
        "Unix time of the last completed poll cycle"
    )
    .unwrap()
});

/// Time spent scanning one watch path.
pub static SCAN_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "plexwatch_scan_duration_seconds",
        "Time spent computing one tree signature",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0]
    )
    .unwrap()
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    // Access lazy statics to register them
    let _ = &*CYCLES_TOTAL;
    let _ = &*CHANGES_TOTAL;
    let _ = &*TRIGGERS_TOTAL;
    let _ = &*STATE_SAVE_FAILURES;
    let _ = &*LIBRARIES_WATCHED;
    let _ = &*LAST_CYCLE_TIMESTAMP;
    let _ = &*SCAN_DURATION;

    tracing::debug!("Prometheus metrics initialized");
}

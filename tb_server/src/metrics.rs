//! Prometheus metrics for monitoring the bracket server.
//!
//! The recorder is installed once at startup and rendered by the `/metrics`
//! route in Prometheus text format.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts and durations by matched route
//! - **Bracket Metrics**: Registrations, regenerations, results and advancement outcomes
//! - **Store Metrics**: Record store health
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use tb_server::metrics;
//!
//! let handle = metrics::install_recorder().unwrap();
//!
//! metrics::http_requests_total("POST", "/api/participants", 201);
//! println!("{}", handle.render());
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder.
///
/// # Returns
///
/// Handle used to render the scrape output, or an error message if a
/// recorder is already installed
pub fn install_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// Increments the total HTTP request counter with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Bracket Metrics
// ============================================================================

/// Increment registered participants counter.
pub fn participants_registered_total(division: &str) {
    metrics::counter!("participants_registered_total",
        "division" => division.to_string()
    )
    .increment(1);
}

/// Record an explicit bracket regeneration and its size.
pub fn bracket_generated(division: &str, match_count: usize) {
    metrics::counter!("brackets_generated_total",
        "division" => division.to_string()
    )
    .increment(1);
    metrics::histogram!("bracket_match_count").record(match_count as f64);
}

/// Increment recorded match results counter.
pub fn match_results_total(division: &str) {
    metrics::counter!("match_results_total",
        "division" => division.to_string()
    )
    .increment(1);
}

/// Increment advancement outcome counter.
///
/// `slot_occupied` outcomes are winners dropped because their destination was
/// already filled.
pub fn advancement_outcomes_total(outcome: &str) {
    metrics::counter!("advancement_outcomes_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// Store Metrics
// ============================================================================

/// Set record store health (1 healthy, 0 unreachable).
pub fn store_healthy(healthy: bool) {
    metrics::gauge!("store_healthy").set(if healthy { 1.0 } else { 0.0 });
}

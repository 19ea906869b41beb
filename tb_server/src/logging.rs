//! Structured logging configuration.
//!
//! The bracket library logs through the `log` facade; the subscriber installed
//! here forwards those records into tracing alongside the server's own events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use tb_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a bracket operation and flag slow ones
///
/// # Arguments
///
/// * `operation` - Operation name
/// * `division` - Division the operation touched
/// * `duration_ms` - Duration in milliseconds
///
/// # Example
///
/// ```
/// use tb_server::logging::log_bracket_operation;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// // ... regenerate the bracket ...
/// let duration = start.elapsed().as_millis() as u64;
/// log_bracket_operation("generate_bracket", "lightweight", duration);
/// ```
pub fn log_bracket_operation(operation: &str, division: &str, duration_ms: u64) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            division = division,
            duration_ms = duration_ms,
            "PERFORMANCE: Slow bracket operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            division = division,
            duration_ms = duration_ms,
            "Bracket operation"
        );
    }
}

/// Log API request/response
///
/// # Arguments
///
/// * `request_id` - Correlation ID of the request
/// * `method` - HTTP method
/// * `path` - Matched route, or the raw path for unmatched requests
/// * `status_code` - Response status code
/// * `duration_ms` - Request duration in milliseconds
pub fn log_api_request(
    request_id: &str,
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
) {
    if status_code >= 500 {
        tracing::error!(
            request_id = request_id,
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request failed"
        );
    } else {
        tracing::info!(
            request_id = request_id,
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}

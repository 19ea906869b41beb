//! HTTP API for the bracket server.
//!
//! # Modules
//!
//! - [`participants`]: Registration and roster management
//! - [`matches`]: Match records, result submission and bracket regeneration
//! - [`brackets`]: Bracket views and bye resolution
//! - [`request_id`]: Request correlation and per-request metrics
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health                            - Server health status
//! GET    /metrics                           - Prometheus scrape output
//! GET    /api/participants                  - List all participants
//! GET    /api/participants/division/{name}  - List one division
//! POST   /api/participants                  - Register (rebuilds the bracket)
//! PATCH  /api/participants/{id}             - Partial update
//! DELETE /api/participants/{id}             - Remove
//! GET    /api/matches                       - List all matches
//! GET    /api/matches/{division}            - List one division
//! POST   /api/matches                       - Insert a match record
//! PATCH  /api/matches/{id}                  - Partial update, advances winners
//! DELETE /api/matches/{id}                  - Remove
//! POST   /api/matches/generate/{division}   - Regenerate a bracket
//! GET    /api/brackets/{division}           - Bracket grouped by round
//! POST   /api/brackets/{division}/byes      - Advance every bye winner
//! ```
//!
//! Errors are returned as `{"error": "..."}` with 400 for invalid input, 404
//! for unknown IDs and 500 for storage failures.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tb_server::api::{AppState, create_router};
//! use tourney_bracket::{MemoryStore, TournamentManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState {
//!     manager: Arc::new(TournamentManager::new(Arc::new(MemoryStore::new()))),
//!     metrics: None,
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod brackets;
pub mod matches;
pub mod participants;
pub mod request_id;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, patch, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tourney_bracket::{TournamentError, TournamentManager};
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TournamentManager>,
    /// Absent when metrics are disabled; `/metrics` then answers 404
    pub metrics: Option<PrometheusHandle>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Build an error response with the given status
pub fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<TournamentError> for ErrorResponse {
    fn from(err: TournamentError) -> Self {
        ErrorResponse {
            error: err.client_message(),
        }
    }
}

/// Map a tournament error onto a status code and client-safe message
pub fn tournament_error(err: TournamentError) -> ApiError {
    let status = match &err {
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        TournamentError::MissingWinner(_)
        | TournamentError::InvalidWinner { .. }
        | TournamentError::InvalidMatch(_) => StatusCode::BAD_REQUEST,
        _ => {
            tracing::error!(error = %err, "Tournament operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(err.into()))
}

/// Map a body that failed to deserialize onto a 400
pub fn invalid_body(rejection: JsonRejection) -> ApiError {
    error(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// Reject empty or whitespace-only required fields
pub fn require_non_empty(fields: &[(&str, &str)]) -> Result<(), ApiError> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(error(
            StatusCode::BAD_REQUEST,
            format!("{} must not be empty", name),
        )),
        None => Ok(()),
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Arguments
///
/// - `state`: Application state with the tournament manager
///
/// # Returns
///
/// Configured Axum router ready to serve requests
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/participants",
            get(participants::list_participants).post(participants::create_participant),
        )
        .route(
            "/participants/division/{division}",
            get(participants::list_division_participants),
        )
        .route(
            "/participants/{id}",
            patch(participants::update_participant).delete(participants::delete_participant),
        )
        .route(
            "/matches",
            get(matches::list_matches).post(matches::create_match),
        )
        // One segment names a division for GET and a match ID otherwise
        .route(
            "/matches/{key}",
            get(matches::list_division_matches)
                .patch(matches::update_match)
                .delete(matches::delete_match),
        )
        .route(
            "/matches/generate/{division}",
            post(matches::generate_bracket),
        )
        .route("/brackets/{division}", get(brackets::get_bracket))
        .route("/brackets/{division}/byes", post(brackets::resolve_byes));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` if the record store answers, or `503 Service Unavailable`
/// otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:5000/health
/// # {"status":"healthy","version":"0.4.0","store":true,"timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match state.manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Record store health check failed");
            false
        }
    };
    crate::metrics::store_healthy(store_healthy);

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

/// Prometheus scrape endpoint.
async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => error(StatusCode::NOT_FOUND, "Metrics are disabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourney_bracket::db::StoreError;

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, Json(body)) = tournament_error(TournamentError::MatchNotFound(5));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Match not found");
    }

    #[test]
    fn test_invalid_winner_maps_to_400() {
        let (status, _) = tournament_error(TournamentError::InvalidWinner {
            match_id: 1,
            winner_id: 2,
        });
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_error_is_sanitized() {
        let (status, Json(body)) = tournament_error(TournamentError::Store(StoreError::Corrupt {
            table: "matches",
            reason: "status 'finished'".to_string(),
        }));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty(&[("playerName", "Ana"), ("division", "open")]).is_ok());

        let (status, Json(body)) =
            require_non_empty(&[("playerName", "Ana"), ("division", "  ")]).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "division must not be empty");
    }
}

//! Match API handlers.
//!
//! Submitting a result (`status: "completed"` with a `winnerId`) moves the
//! winner into the next round before the response is sent.
//!
//! # Examples
//!
//! Record a result:
//! ```bash
//! curl -X PATCH http://localhost:5000/api/matches/12 \
//!   -H "Content-Type: application/json" \
//!   -d '{"status": "completed", "winnerId": 3}'
//! ```

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::time::Instant;
use tourney_bracket::tournament::{Match, MatchId, MatchUpdate, NewMatch};

use super::{ApiError, AppState, invalid_body, require_non_empty, tournament_error};
use crate::{logging, metrics};

/// List every match.
pub async fn list_matches(State(state): State<AppState>) -> Result<Json<Vec<Match>>, ApiError> {
    state
        .manager
        .list_matches(None)
        .await
        .map(Json)
        .map_err(tournament_error)
}

/// List the matches of one division.
pub async fn list_division_matches(
    State(state): State<AppState>,
    Path(division): Path<String>,
) -> Result<Json<Vec<Match>>, ApiError> {
    state
        .manager
        .list_matches(Some(&division))
        .await
        .map(Json)
        .map_err(tournament_error)
}

/// Insert a match record verbatim.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body, empty division, a round or match
///   number outside the bracket range, or a winner who does not play in the
///   match
pub async fn create_match(
    State(state): State<AppState>,
    payload: Result<Json<NewMatch>, JsonRejection>,
) -> Result<(StatusCode, Json<Match>), ApiError> {
    let Json(request) = payload.map_err(invalid_body)?;
    require_non_empty(&[("division", request.division.as_str())])?;

    state
        .manager
        .create_match(request)
        .await
        .map(|created| (StatusCode::CREATED, Json(created)))
        .map_err(tournament_error)
}

/// Apply a partial update to a match.
///
/// # Request Body
///
/// ```json
/// {
///   "status": "completed",
///   "winnerId": 3
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body, or completion without a winner who
///   plays in the match
/// - `404 Not Found`: Match doesn't exist
pub async fn update_match(
    State(state): State<AppState>,
    Path(id): Path<MatchId>,
    payload: Result<Json<MatchUpdate>, JsonRejection>,
) -> Result<Json<Match>, ApiError> {
    let Json(update) = payload.map_err(invalid_body)?;
    let completes = update.completes();

    let outcome = state
        .manager
        .update_match(id, update)
        .await
        .map_err(tournament_error)?;

    if completes {
        metrics::match_results_total(&outcome.updated.division);
    }
    if let Some(advancement) = outcome.advancement {
        metrics::advancement_outcomes_total(advancement.label());
    }

    Ok(Json(outcome.updated))
}

/// Remove a match.
///
/// Returns `204 No Content`, or `404 Not Found` for an unknown ID.
pub async fn delete_match(
    State(state): State<AppState>,
    Path(id): Path<MatchId>,
) -> Result<StatusCode, ApiError> {
    state
        .manager
        .delete_match(id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(tournament_error)
}

/// Regenerate a division's bracket from its current roster.
///
/// Returns the created matches; a division with fewer than two participants
/// keeps its existing matches, which are returned unchanged.
pub async fn generate_bracket(
    State(state): State<AppState>,
    Path(division): Path<String>,
) -> Result<Json<Vec<Match>>, ApiError> {
    let start = Instant::now();
    let matches = state
        .manager
        .generate_bracket(&division)
        .await
        .map_err(tournament_error)?;

    logging::log_bracket_operation(
        "generate_bracket",
        &division,
        start.elapsed().as_millis() as u64,
    );
    metrics::bracket_generated(&division, matches.len());

    Ok(Json(matches))
}

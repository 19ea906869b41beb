//! Bracket view and bye resolution handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use std::time::Instant;
use tourney_bracket::{Advancement, tournament::BracketView};

use super::{ApiError, AppState, tournament_error};
use crate::{logging, metrics};

/// Get a division's bracket grouped by round.
///
/// # Response
///
/// ```json
/// {
///   "division": "lightweight",
///   "participantCount": 3,
///   "bracketSize": 4,
///   "totalRounds": 2,
///   "rounds": { "1": [...], "2": [...] },
///   "champion": null
/// }
/// ```
pub async fn get_bracket(
    State(state): State<AppState>,
    Path(division): Path<String>,
) -> Result<Json<BracketView>, ApiError> {
    state
        .manager
        .bracket(&division)
        .await
        .map(Json)
        .map_err(tournament_error)
}

/// Advance every first-round bye winner into round 2.
///
/// Returns one advancement outcome per bye, in match order. Repeating the
/// call reports `slot_occupied` for byes already advanced.
pub async fn resolve_byes(
    State(state): State<AppState>,
    Path(division): Path<String>,
) -> Result<Json<Vec<Advancement>>, ApiError> {
    let start = Instant::now();
    let outcomes = state
        .manager
        .resolve_byes(&division)
        .await
        .map_err(tournament_error)?;

    logging::log_bracket_operation(
        "resolve_byes",
        &division,
        start.elapsed().as_millis() as u64,
    );
    for outcome in &outcomes {
        metrics::advancement_outcomes_total(outcome.label());
    }

    Ok(Json(outcomes))
}

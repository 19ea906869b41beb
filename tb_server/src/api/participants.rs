//! Participant API handlers.
//!
//! Registering a participant rebuilds their division's bracket, so earlier
//! match IDs of that division stop resolving.
//!
//! # Examples
//!
//! Register a participant:
//! ```bash
//! curl -X POST http://localhost:5000/api/participants \
//!   -H "Content-Type: application/json" \
//!   -d '{"playerName": "Ana", "discordUser": "ana#1", "robloxUser": "ana_rbx", "division": "lightweight"}'
//! ```

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use tourney_bracket::tournament::{NewParticipant, Participant, ParticipantId, ParticipantUpdate};

use super::{ApiError, AppState, invalid_body, require_non_empty, tournament_error};
use crate::metrics;

/// List every participant in registration order.
pub async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    state
        .manager
        .list_participants(None)
        .await
        .map(Json)
        .map_err(tournament_error)
}

/// List the participants of one division.
pub async fn list_division_participants(
    State(state): State<AppState>,
    Path(division): Path<String>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    state
        .manager
        .list_participants(Some(&division))
        .await
        .map(Json)
        .map_err(tournament_error)
}

/// Register a participant.
///
/// # Request Body
///
/// ```json
/// {
///   "playerName": "Ana",
///   "discordUser": "ana#1",
///   "robloxUser": "ana_rbx",
///   "division": "lightweight",
///   "experience": "two seasons"  // Optional
/// }
/// ```
///
/// # Response
///
/// Returns `201 Created` with the stored participant.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or an empty required field
/// - `500 Internal Server Error`: Storage failure
pub async fn create_participant(
    State(state): State<AppState>,
    payload: Result<Json<NewParticipant>, JsonRejection>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let Json(request) = payload.map_err(invalid_body)?;
    require_non_empty(&[
        ("playerName", request.player_name.as_str()),
        ("discordUser", request.discord_user.as_str()),
        ("robloxUser", request.roblox_user.as_str()),
        ("division", request.division.as_str()),
    ])?;

    let participant = state
        .manager
        .register_participant(request)
        .await
        .map_err(tournament_error)?;

    metrics::participants_registered_total(&participant.division);
    Ok((StatusCode::CREATED, Json(participant)))
}

/// Apply a partial update to a participant.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or a blanked required field
/// - `404 Not Found`: Participant doesn't exist
pub async fn update_participant(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
    payload: Result<Json<ParticipantUpdate>, JsonRejection>,
) -> Result<Json<Participant>, ApiError> {
    let Json(update) = payload.map_err(invalid_body)?;

    let provided: Vec<(&str, &str)> = [
        ("playerName", update.player_name.as_deref()),
        ("discordUser", update.discord_user.as_deref()),
        ("robloxUser", update.roblox_user.as_deref()),
        ("division", update.division.as_deref()),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| (name, v)))
    .collect();
    require_non_empty(&provided)?;

    state
        .manager
        .update_participant(id, update)
        .await
        .map(Json)
        .map_err(tournament_error)
}

/// Remove a participant.
///
/// Returns `204 No Content`, or `404 Not Found` for an unknown ID.
pub async fn delete_participant(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
) -> Result<StatusCode, ApiError> {
    state
        .manager
        .remove_participant(id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(tournament_error)
}

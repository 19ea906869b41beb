//! Tournament error types.

use thiserror::Error;

use super::models::{MatchId, ParticipantId};
use crate::db::StoreError;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// Completing a match needs a winner
    #[error("Match {0} cannot be completed without a winner")]
    MissingWinner(MatchId),

    /// Winner must occupy one of the match's slots
    #[error("Participant {winner_id} is not playing in match {match_id}")]
    InvalidWinner {
        match_id: MatchId,
        winner_id: ParticipantId,
    },

    /// Inserted match cannot belong to a bracket
    #[error("Invalid match: {0}")]
    InvalidMatch(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TournamentError {
    /// Whether the error names an identifier that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TournamentError::ParticipantNotFound(_) | TournamentError::MatchNotFound(_)
        )
    }

    /// Get a client-safe error message
    ///
    /// Storage errors are collapsed so SQL details never reach API clients.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::ParticipantNotFound(_) => "Participant not found".to_string(),
            TournamentError::MatchNotFound(_) => "Match not found".to_string(),
            TournamentError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_store_details() {
        let err = TournamentError::Store(StoreError::Corrupt {
            table: "matches",
            reason: "bad status".to_string(),
        });
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.to_string().contains("bad status"));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(TournamentError::MatchNotFound(3).is_not_found());
        assert!(TournamentError::ParticipantNotFound(3).is_not_found());
        assert!(!TournamentError::MissingWinner(3).is_not_found());
    }

    #[test]
    fn test_invalid_winner_message() {
        let err = TournamentError::InvalidWinner {
            match_id: 4,
            winner_id: 9,
        };
        assert_eq!(err.client_message(), "Participant 9 is not playing in match 4");
    }

    #[test]
    fn test_invalid_match_message() {
        let err = TournamentError::InvalidMatch("round must be between 1 and 63".to_string());
        assert_eq!(
            err.client_message(),
            "Invalid match: round must be between 1 and 63"
        );
        assert!(!err.is_not_found());
    }
}

//! Tournament workflows for single-elimination divisions.
//!
//! This module provides:
//! - Participant registration, which rebuilds the division's bracket
//! - Match result submission with automatic winner advancement
//! - Bye resolution and bracket views grouped by round
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tourney_bracket::db::MemoryStore;
//! use tourney_bracket::tournament::{MatchUpdate, NewParticipant, TournamentManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new(Arc::new(MemoryStore::new()));
//!
//!     for name in ["Ana", "Bo"] {
//!         manager
//!             .register_participant(NewParticipant::named(name, "open"))
//!             .await?;
//!     }
//!
//!     let final_match = manager.bracket("open").await?.round(1)[0].clone();
//!     let winner = final_match.participant1_id.unwrap_or_default();
//!     manager
//!         .update_match(final_match.id, MatchUpdate::complete(winner))
//!         .await?;
//!
//!     assert_eq!(manager.bracket("open").await?.champion, Some(winner));
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{TournamentError, TournamentResult};
pub use manager::{MatchUpdateOutcome, TournamentManager};
pub use models::{
    BracketView, Match, MatchId, MatchStatus, MatchUpdate, NewMatch, NewParticipant,
    Participant, ParticipantId, ParticipantStatus, ParticipantUpdate, Slot, UnknownStatus,
};

//! # Tourney Bracket
//!
//! A single-elimination bracket engine for divisional tournaments.
//!
//! Participants register into a division; every registration rebuilds the
//! division's bracket. Recording a match result moves the winner into the
//! next round until one participant is left.
//!
//! ## Core Modules
//!
//! - [`bracket`]: Bracket layout, seeding and winner advancement
//! - [`db`]: Record stores (PostgreSQL and in-memory)
//! - [`tournament`]: Data models and the [`TournamentManager`] workflows
//!
//! ## Example
//!
//! ```
//! use tourney_bracket::bracket::{bracket_size, bye_count, total_rounds};
//!
//! // Five players need an eight-slot bracket with three byes
//! assert_eq!(bracket_size(5), 8);
//! assert_eq!(total_rounds(5), 3);
//! assert_eq!(bye_count(5), 3);
//! ```

/// Bracket generation and advancement.
pub mod bracket;

/// Persistence layer.
pub mod db;

/// Tournament models and workflows.
pub mod tournament;

pub use bracket::{Advancement, AdvancementEngine, BracketGenerator};
pub use db::{Database, DatabaseConfig, MemoryStore, PgRecordStore, RecordStore};
pub use tournament::{TournamentError, TournamentManager, TournamentResult};

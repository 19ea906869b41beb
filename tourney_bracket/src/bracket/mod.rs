//! Single-elimination bracket engine.
//!
//! - [`generator`]: builds a division's match tree from its roster
//! - [`advancement`]: routes each winner into the next round
//! - [`seeding`]: pluggable permutation of the roster before pairing
//!
//! ## Example
//!
//! ```
//! use tourney_bracket::bracket::{bracket_size, plan_bracket, total_rounds};
//!
//! assert_eq!(bracket_size(3), 4);
//! assert_eq!(total_rounds(3), 2);
//!
//! // Two paired players and one bye in round 1, an empty final in round 2
//! let plan = plan_bracket("lightweight", &[1, 2, 3]);
//! assert_eq!(plan.len(), 3);
//! ```

pub mod advancement;
pub mod generator;
pub mod seeding;

pub use advancement::{Advancement, AdvancementEngine, parent_position};
pub use generator::{
    BracketGenerator, MAX_MATCH_NUMBER, MAX_ROUNDS, bracket_size, bye_count, plan_bracket,
    total_rounds,
};
pub use seeding::{RandomSeeder, RegistrationOrderSeeder, Seeder};

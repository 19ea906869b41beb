//! Winner advancement: moves a decided match's winner into the next round.
//!
//! The tree is never stored. A round-r match at position `m` feeds the
//! round-(r+1) match at position `(m - 1) / 2 + 1`, first slot for odd `m` and
//! second slot for even `m`. That only holds while match numbers are the
//! positions the generator assigned; renumbering matches after generation
//! misroutes winners. Storing an explicit parent ID on each match would remove
//! that dependency at the cost of an extra column.

use serde::Serialize;
use std::sync::Arc;

use crate::db::{MatchRepository, RecordStore, StoreResult};
use crate::tournament::models::{Match, MatchId, ParticipantId, Slot};

/// Where the winner of the match at `match_number` goes in the next round
///
/// Returns the zero-based index into the next round (sorted by match number)
/// and the slot to fill.
pub fn parent_position(match_number: u32) -> (usize, Slot) {
    let offset = match_number.saturating_sub(1) as usize;
    let slot = if offset % 2 == 0 {
        Slot::First
    } else {
        Slot::Second
    };
    (offset / 2, slot)
}

/// Outcome of one advancement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Advancement {
    /// Winner written into the next round
    Placed {
        match_id: MatchId,
        slot: Slot,
        /// Both slots of the target are now filled
        ready: bool,
    },
    /// Destined slot already held a participant; nothing changed
    SlotOccupied { match_id: MatchId, slot: Slot },
    /// There is no next round: the winner is the division champion
    Champion { winner: ParticipantId },
    /// Next round exists but has no match at the computed position
    NoTarget,
    /// The match carries no winner
    NoWinner,
}

impl Advancement {
    pub fn label(&self) -> &'static str {
        match self {
            Advancement::Placed { .. } => "placed",
            Advancement::SlotOccupied { .. } => "slot_occupied",
            Advancement::Champion { .. } => "champion",
            Advancement::NoTarget => "no_target",
            Advancement::NoWinner => "no_winner",
        }
    }
}

/// Propagates match results upward through the bracket
#[derive(Clone)]
pub struct AdvancementEngine {
    store: Arc<dyn RecordStore>,
}

impl AdvancementEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Advance the winner of `completed` into its next-round match
    ///
    /// Mutates at most one match. An occupied destination slot is left alone
    /// and reported as [`Advancement::SlotOccupied`], which makes repeated
    /// calls for the same match harmless.
    pub async fn advance(&self, completed: &Match) -> StoreResult<Advancement> {
        let Some(winner) = completed.winner_id else {
            return Ok(Advancement::NoWinner);
        };

        let Some(next_round) = completed.round.checked_add(1) else {
            return Ok(Advancement::NoTarget);
        };
        let mut candidates: Vec<Match> = self
            .store
            .list_matches(&completed.division)
            .await?
            .into_iter()
            .filter(|m| m.round == next_round)
            .collect();

        if candidates.is_empty() {
            log::info!(
                "Division {} decided: participant {} won the final",
                completed.division,
                winner
            );
            return Ok(Advancement::Champion { winner });
        }

        // Store order is unspecified; positions are only meaningful sorted
        candidates.sort_by_key(|m| m.match_number);

        let (index, slot) = parent_position(completed.match_number);
        let Some(target) = candidates.get(index) else {
            log::warn!(
                "Division {} round {} has no match at position {} for match {}",
                completed.division,
                next_round,
                index + 1,
                completed.id
            );
            return Ok(Advancement::NoTarget);
        };

        if target.slot(slot).is_some() {
            return Ok(Advancement::SlotOccupied {
                match_id: target.id,
                slot,
            });
        }

        match self.store.fill_slot(target.id, slot, winner).await? {
            Some(updated) => {
                log::debug!(
                    "Advanced participant {} from match {} to match {} ({:?} slot)",
                    winner,
                    completed.id,
                    updated.id,
                    slot
                );
                Ok(Advancement::Placed {
                    match_id: updated.id,
                    slot,
                    ready: updated.is_ready(),
                })
            }
            // Another writer filled the slot between our read and write
            None => Ok(Advancement::SlotOccupied {
                match_id: target.id,
                slot,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::tournament::models::{MatchStatus, NewMatch};

    #[test]
    fn test_parent_position_pairs_neighbours() {
        assert_eq!(parent_position(1), (0, Slot::First));
        assert_eq!(parent_position(2), (0, Slot::Second));
        assert_eq!(parent_position(3), (1, Slot::First));
        assert_eq!(parent_position(4), (1, Slot::Second));
        assert_eq!(parent_position(8), (3, Slot::Second));
    }

    #[test]
    fn test_parent_position_tolerates_zero() {
        assert_eq!(parent_position(0), (0, Slot::First));
    }

    #[test]
    fn test_advancement_labels() {
        assert_eq!(Advancement::NoTarget.label(), "no_target");
        assert_eq!(Advancement::Champion { winner: 1 }.label(), "champion");
        assert_eq!(
            Advancement::SlotOccupied {
                match_id: 3,
                slot: Slot::First
            }
            .label(),
            "slot_occupied"
        );
    }

    #[tokio::test]
    async fn test_last_representable_round_has_no_target() {
        let store = Arc::new(MemoryStore::new());
        let last = store
            .insert_match(NewMatch {
                participant1_id: Some(1),
                participant2_id: Some(2),
                winner_id: Some(1),
                status: MatchStatus::Completed,
                ..NewMatch::placeholder("open", u32::MAX, 1)
            })
            .await
            .unwrap();
        store
            .insert_match(NewMatch::placeholder("open", 1, 1))
            .await
            .unwrap();

        let outcome = AdvancementEngine::new(store).advance(&last).await.unwrap();
        assert_eq!(outcome, Advancement::NoTarget);
    }
}

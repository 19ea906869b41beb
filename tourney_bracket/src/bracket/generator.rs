//! Bracket generation: turns a division roster into a full elimination tree.

use std::sync::Arc;

use super::seeding::Seeder;
use crate::db::{MatchRepository, ParticipantRepository, RecordStore, StoreResult};
use crate::tournament::models::{Match, NewMatch, ParticipantId};

/// Deepest round a stored bracket may have; `1 << MAX_ROUNDS` still fits a `usize`
pub const MAX_ROUNDS: u32 = usize::BITS - 1;

/// Largest match number a stored bracket may use
pub const MAX_MATCH_NUMBER: u32 = i32::MAX as u32;

/// Smallest power of two that holds `participants` (1 for an empty roster)
pub fn bracket_size(participants: usize) -> usize {
    participants.max(1).next_power_of_two()
}

/// Number of rounds needed to reduce `participants` to one champion
pub fn total_rounds(participants: usize) -> u32 {
    bracket_size(participants).trailing_zeros()
}

/// Number of first-round matches decided by a bye
pub fn bye_count(participants: usize) -> usize {
    if participants < 2 {
        0
    } else {
        bracket_size(participants) - participants
    }
}

/// Lay out every match of a bracket for an already seeded roster
///
/// Round 1 holds `bracket_size / 2` matches: consecutive pairs of `seeded`
/// first, then one bye per leftover participant. Byes are completed with
/// their only occupant as winner. Later rounds are empty placeholders. Match
/// numbers restart at 1 in every round.
///
/// Returns an empty plan for fewer than two participants.
pub fn plan_bracket(division: &str, seeded: &[ParticipantId]) -> Vec<NewMatch> {
    let participants = seeded.len();
    if participants < 2 {
        return Vec::new();
    }

    let size = bracket_size(participants);
    let rounds = total_rounds(participants);
    let byes = bye_count(participants);
    let paired = size / 2 - byes;

    let mut planned = Vec::with_capacity(size - 1);
    let (pairs, bye_holders) = seeded.split_at(paired * 2);

    let mut match_number = 1;
    for pair in pairs.chunks_exact(2) {
        planned.push(NewMatch::paired(division, match_number, pair[0], pair[1]));
        match_number += 1;
    }
    for &participant in bye_holders {
        planned.push(NewMatch::bye(division, match_number, participant));
        match_number += 1;
    }

    for round in 2..=rounds {
        let matches_in_round = size >> round;
        for position in 1..=matches_in_round {
            planned.push(NewMatch::placeholder(division, round, position as u32));
        }
    }

    planned
}

/// Builds (and rebuilds) a division's bracket from its current roster
#[derive(Clone)]
pub struct BracketGenerator {
    store: Arc<dyn RecordStore>,
    seeder: Arc<dyn Seeder>,
}

impl BracketGenerator {
    pub fn new(store: Arc<dyn RecordStore>, seeder: Arc<dyn Seeder>) -> Self {
        Self { store, seeder }
    }

    /// Regenerate the bracket of `division`
    ///
    /// With fewer than two participants the existing matches are returned
    /// untouched. Otherwise every existing match of the division is replaced
    /// in one store operation, so earlier match IDs stop resolving.
    ///
    /// # Returns
    ///
    /// * `StoreResult<Vec<Match>>` - Created matches in creation order
    pub async fn generate(&self, division: &str) -> StoreResult<Vec<Match>> {
        let participants = self.store.list_participants(division).await?;
        if participants.len() < 2 {
            log::debug!(
                "Division {} has {} participant(s), keeping existing bracket",
                division,
                participants.len()
            );
            return self.store.list_matches(division).await;
        }

        let mut seeded: Vec<ParticipantId> = participants.iter().map(|p| p.id).collect();
        self.seeder.seed(&mut seeded);

        let planned = plan_bracket(division, &seeded);
        let matches = self
            .store
            .replace_division_matches(division, planned)
            .await?;

        log::info!(
            "Generated bracket for division {}: {} participants, size {}, {} rounds, {} byes",
            division,
            seeded.len(),
            bracket_size(seeded.len()),
            total_rounds(seeded.len()),
            bye_count(seeded.len())
        );

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::MatchStatus;

    #[test]
    fn test_bracket_size_rounds_up_to_power_of_two() {
        assert_eq!(bracket_size(0), 1);
        assert_eq!(bracket_size(1), 1);
        assert_eq!(bracket_size(2), 2);
        assert_eq!(bracket_size(3), 4);
        assert_eq!(bracket_size(4), 4);
        assert_eq!(bracket_size(5), 8);
        assert_eq!(bracket_size(17), 32);
    }

    #[test]
    fn test_total_rounds() {
        assert_eq!(total_rounds(1), 0);
        assert_eq!(total_rounds(2), 1);
        assert_eq!(total_rounds(3), 2);
        assert_eq!(total_rounds(8), 3);
        assert_eq!(total_rounds(9), 4);
    }

    #[test]
    fn test_plan_is_empty_below_two_participants() {
        assert!(plan_bracket("open", &[]).is_empty());
        assert!(plan_bracket("open", &[1]).is_empty());
    }

    #[test]
    fn test_plan_for_three_pairs_then_byes() {
        let plan = plan_bracket("lightweight", &[10, 11, 12]);
        assert_eq!(plan.len(), 3);

        assert_eq!(plan[0].round, 1);
        assert_eq!(plan[0].match_number, 1);
        assert_eq!(plan[0].participant1_id, Some(10));
        assert_eq!(plan[0].participant2_id, Some(11));
        assert_eq!(plan[0].status, MatchStatus::Pending);

        assert_eq!(plan[1].match_number, 2);
        assert_eq!(plan[1].participant1_id, Some(12));
        assert_eq!(plan[1].participant2_id, None);
        assert_eq!(plan[1].winner_id, Some(12));
        assert_eq!(plan[1].status, MatchStatus::Completed);

        assert_eq!(plan[2].round, 2);
        assert_eq!(plan[2].match_number, 1);
        assert_eq!(plan[2].participant1_id, None);
        assert_eq!(plan[2].participant2_id, None);
        assert_eq!(plan[2].status, MatchStatus::Pending);
    }

    #[test]
    fn test_plan_for_five_fills_the_first_round() {
        let plan = plan_bracket("open", &[1, 2, 3, 4, 5]);
        let first_round: Vec<_> = plan.iter().filter(|m| m.round == 1).collect();

        assert_eq!(plan.len(), 7);
        assert_eq!(first_round.len(), 4);
        assert_eq!(first_round.iter().filter(|m| m.winner_id.is_some()).count(), 3);
        assert_eq!(plan.iter().filter(|m| m.round == 2).count(), 2);
        assert_eq!(plan.iter().filter(|m| m.round == 3).count(), 1);
    }

    #[test]
    fn test_plan_numbers_each_round_from_one() {
        let plan = plan_bracket("open", &(1..=16).collect::<Vec<_>>());
        for round in 1..=4 {
            let numbers: Vec<u32> = plan
                .iter()
                .filter(|m| m.round == round)
                .map(|m| m.match_number)
                .collect();
            let expected: Vec<u32> = (1..=(16u32 >> round)).collect();
            assert_eq!(numbers, expected, "round {} numbering", round);
        }
    }
}

//! Tournament manager: the registration, result and bracket workflows.

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::{
    errors::{TournamentError, TournamentResult},
    models::{
        BracketView, Match, MatchId, MatchUpdate, NewMatch, NewParticipant, Participant,
        ParticipantId, ParticipantUpdate,
    },
};
use crate::bracket::{
    Advancement, AdvancementEngine, BracketGenerator, MAX_MATCH_NUMBER, MAX_ROUNDS,
    RandomSeeder, Seeder, bracket_size,
};
use crate::db::{MatchRepository, ParticipantRepository, RecordStore};

/// Stored match after an update, plus what advancement did with its winner
#[derive(Debug, Clone)]
pub struct MatchUpdateOutcome {
    pub updated: Match,
    /// `None` unless the update completed the match
    pub advancement: Option<Advancement>,
}

enum WinnerProblem {
    Missing,
    NotPlaying(ParticipantId),
}

fn winner_problem(m: &Match) -> Option<WinnerProblem> {
    match m.winner_id {
        None if m.is_completed() => Some(WinnerProblem::Missing),
        Some(winner) if !m.has_participant(winner) => Some(WinnerProblem::NotPlaying(winner)),
        _ => None,
    }
}

/// Tournament manager
///
/// Every operation that reads and then rewrites a division's matches runs
/// under that division's lock, so generation and advancement never
/// interleave within one division. Different divisions proceed in parallel.
#[derive(Clone)]
pub struct TournamentManager {
    store: Arc<dyn RecordStore>,
    generator: BracketGenerator,
    advancement: AdvancementEngine,
    division_locks: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

impl TournamentManager {
    /// Create a manager that seeds brackets randomly
    ///
    /// # Arguments
    ///
    /// * `store` - Record store holding participants and matches
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_seeder(store, Arc::new(RandomSeeder::new()))
    }

    /// Create a manager with an explicit seeding strategy
    pub fn with_seeder(store: Arc<dyn RecordStore>, seeder: Arc<dyn Seeder>) -> Self {
        Self {
            generator: BracketGenerator::new(store.clone(), seeder),
            advancement: AdvancementEngine::new(store.clone()),
            store,
            division_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    async fn division_lock(&self, division: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.division_locks.read().await.get(division) {
            return lock.clone();
        }

        self.division_locks
            .write()
            .await
            .entry(division.to_string())
            .or_default()
            .clone()
    }

    /// Register a participant and rebuild their division's bracket
    ///
    /// # Returns
    ///
    /// * `TournamentResult<Participant>` - The stored participant
    pub async fn register_participant(
        &self,
        request: NewParticipant,
    ) -> TournamentResult<Participant> {
        let lock = self.division_lock(&request.division).await;
        let _guard = lock.lock().await;

        let participant = self.store.insert_participant(request).await?;
        log::info!(
            "Registered participant {} ({}) in division {}",
            participant.id,
            participant.player_name,
            participant.division
        );

        self.generator.generate(&participant.division).await?;
        Ok(participant)
    }

    pub async fn get_participant(&self, id: ParticipantId) -> TournamentResult<Participant> {
        self.store
            .get_participant(id)
            .await?
            .ok_or(TournamentError::ParticipantNotFound(id))
    }

    /// List participants in registration order, optionally for one division
    pub async fn list_participants(
        &self,
        division: Option<&str>,
    ) -> TournamentResult<Vec<Participant>> {
        let participants = match division {
            Some(division) => self.store.list_participants(division).await?,
            None => self.store.list_all_participants().await?,
        };
        Ok(participants)
    }

    /// Apply a partial update to a participant
    ///
    /// Moving a participant into another division rebuilds both brackets. A
    /// division left with fewer than two participants loses its matches.
    pub async fn update_participant(
        &self,
        id: ParticipantId,
        update: ParticipantUpdate,
    ) -> TournamentResult<Participant> {
        loop {
            let before = self.get_participant(id).await?;
            let target = update
                .division
                .clone()
                .unwrap_or_else(|| before.division.clone());

            // Fixed order so two opposite moves cannot deadlock
            let mut divisions = vec![before.division.clone(), target];
            divisions.sort();
            divisions.dedup();
            let mut guards = Vec::with_capacity(divisions.len());
            for division in &divisions {
                guards.push(self.division_lock(division).await.lock_owned().await);
            }

            // Moved by someone else before we got the locks
            if self.get_participant(id).await?.division != before.division {
                continue;
            }

            let updated = self
                .store
                .update_participant(id, &update)
                .await?
                .ok_or(TournamentError::ParticipantNotFound(id))?;

            if updated.division != before.division {
                log::info!(
                    "Participant {} moved from division {} to {}",
                    id,
                    before.division,
                    updated.division
                );
                self.rebuild_after_departure(&before.division).await?;
                self.generator.generate(&updated.division).await?;
            }

            return Ok(updated);
        }
    }

    /// Regenerate a division someone left, or clear it when no pairing remains
    async fn rebuild_after_departure(&self, division: &str) -> TournamentResult<()> {
        if self.store.list_participants(division).await?.len() >= 2 {
            self.generator.generate(division).await?;
        } else {
            self.store.replace_division_matches(division, Vec::new()).await?;
            log::info!(
                "Cleared bracket of division {}: fewer than two participants left",
                division
            );
        }
        Ok(())
    }

    /// Delete a participant; existing matches keep referencing the ID
    pub async fn remove_participant(&self, id: ParticipantId) -> TournamentResult<()> {
        if !self.store.delete_participant(id).await? {
            return Err(TournamentError::ParticipantNotFound(id));
        }
        log::info!("Removed participant {}", id);
        Ok(())
    }

    /// Insert a match verbatim, outside of bracket generation
    ///
    /// The position must fit a real bracket: round between 1 and
    /// [`MAX_ROUNDS`], match number between 1 and [`MAX_MATCH_NUMBER`]. A
    /// winner must play in the match, and a completed match needs one.
    pub async fn create_match(&self, request: NewMatch) -> TournamentResult<Match> {
        if !(1..=MAX_ROUNDS).contains(&request.round) {
            return Err(TournamentError::InvalidMatch(format!(
                "round must be between 1 and {}",
                MAX_ROUNDS
            )));
        }
        if !(1..=MAX_MATCH_NUMBER).contains(&request.match_number) {
            return Err(TournamentError::InvalidMatch(format!(
                "matchNumber must be between 1 and {}",
                MAX_MATCH_NUMBER
            )));
        }

        let preview = request.clone().into_match(0, Utc::now());
        match winner_problem(&preview) {
            Some(WinnerProblem::Missing) => {
                return Err(TournamentError::InvalidMatch(
                    "a completed match needs a winner".to_string(),
                ));
            }
            Some(WinnerProblem::NotPlaying(winner)) => {
                return Err(TournamentError::InvalidMatch(format!(
                    "winner {} is not playing in the match",
                    winner
                )));
            }
            None => {}
        }

        let lock = self.division_lock(&request.division).await;
        let _guard = lock.lock().await;

        Ok(self.store.insert_match(request).await?)
    }

    pub async fn get_match(&self, id: MatchId) -> TournamentResult<Match> {
        self.store
            .get_match(id)
            .await?
            .ok_or(TournamentError::MatchNotFound(id))
    }

    /// List matches, optionally for one division
    pub async fn list_matches(&self, division: Option<&str>) -> TournamentResult<Vec<Match>> {
        let matches = match division {
            Some(division) => self.store.list_matches(division).await?,
            None => self.store.list_all_matches().await?,
        };
        Ok(matches)
    }

    /// Apply a partial update to a match
    ///
    /// The match as it would be stored must keep its winner in one of its
    /// slots, and a completed match must have one. That holds whichever
    /// fields the update touches. When the update completes the match its
    /// winner is advanced into the next round before this returns.
    ///
    /// # Arguments
    ///
    /// * `id` - Match ID
    /// * `update` - Fields to change
    ///
    /// # Returns
    ///
    /// * `TournamentResult<MatchUpdateOutcome>` - Stored match and advancement outcome
    pub async fn update_match(
        &self,
        id: MatchId,
        update: MatchUpdate,
    ) -> TournamentResult<MatchUpdateOutcome> {
        let division = self.get_match(id).await?.division;
        let lock = self.division_lock(&division).await;
        let _guard = lock.lock().await;

        // Re-read under the lock; a regeneration may have removed the match
        let current = self.get_match(id).await?;
        Self::validate_result(&current, &update)?;

        let updated = self
            .store
            .update_match(id, &update)
            .await?
            .ok_or(TournamentError::MatchNotFound(id))?;

        let advancement = if update.completes() && updated.winner_id.is_some() {
            let outcome = self.advancement.advance(&updated).await?;
            match outcome {
                Advancement::SlotOccupied { match_id, slot } => log::debug!(
                    "Winner of match {} not advanced: {:?} slot of match {} already filled",
                    id,
                    slot,
                    match_id
                ),
                other => log::debug!("Match {} advancement: {}", id, other.label()),
            }
            Some(outcome)
        } else {
            None
        };

        Ok(MatchUpdateOutcome {
            updated,
            advancement,
        })
    }

    fn validate_result(current: &Match, update: &MatchUpdate) -> TournamentResult<()> {
        let mut preview = current.clone();
        update.apply(&mut preview);

        match winner_problem(&preview) {
            Some(WinnerProblem::Missing) => Err(TournamentError::MissingWinner(current.id)),
            Some(WinnerProblem::NotPlaying(winner)) => Err(TournamentError::InvalidWinner {
                match_id: current.id,
                winner_id: winner,
            }),
            None => Ok(()),
        }
    }

    pub async fn delete_match(&self, id: MatchId) -> TournamentResult<()> {
        if !self.store.delete_match(id).await? {
            return Err(TournamentError::MatchNotFound(id));
        }
        Ok(())
    }

    /// Rebuild a division's bracket from its current roster
    pub async fn generate_bracket(&self, division: &str) -> TournamentResult<Vec<Match>> {
        let lock = self.division_lock(division).await;
        let _guard = lock.lock().await;

        Ok(self.generator.generate(division).await?)
    }

    /// Move every first-round bye winner into round 2
    ///
    /// Safe to repeat: byes already advanced report
    /// [`Advancement::SlotOccupied`].
    pub async fn resolve_byes(&self, division: &str) -> TournamentResult<Vec<Advancement>> {
        let lock = self.division_lock(division).await;
        let _guard = lock.lock().await;

        let mut byes: Vec<Match> = self
            .store
            .list_matches(division)
            .await?
            .into_iter()
            .filter(Match::is_bye)
            .collect();
        byes.sort_by_key(|m| m.match_number);

        let mut outcomes = Vec::with_capacity(byes.len());
        for bye in &byes {
            outcomes.push(self.advancement.advance(bye).await?);
        }

        let placed = outcomes
            .iter()
            .filter(|o| matches!(o, Advancement::Placed { .. }))
            .count();
        log::info!(
            "Resolved byes in division {}: {} of {} advanced",
            division,
            placed,
            byes.len()
        );

        Ok(outcomes)
    }

    /// Current bracket of a division grouped by round
    pub async fn bracket(&self, division: &str) -> TournamentResult<BracketView> {
        let participant_count = self.store.list_participants(division).await?.len();
        let mut matches = self.store.list_matches(division).await?;
        matches.sort_by_key(|m| (m.round, m.match_number));

        let mut rounds: BTreeMap<u32, Vec<Match>> = BTreeMap::new();
        for m in matches {
            rounds.entry(m.round).or_default().push(m);
        }
        let total_rounds = rounds.keys().next_back().copied().unwrap_or(0);

        let champion = match rounds.values().next_back().map(Vec::as_slice) {
            Some([final_match]) if final_match.is_completed() => final_match.winner_id,
            _ => None,
        };

        let bracket_size = if total_rounds == 0 {
            bracket_size(participant_count)
        } else {
            1usize.checked_shl(total_rounds).unwrap_or(usize::MAX)
        };

        Ok(BracketView {
            division: division.to_string(),
            participant_count,
            bracket_size,
            total_rounds,
            rounds,
            champion,
        })
    }

    /// Check that the record store is reachable
    pub async fn health_check(&self) -> TournamentResult<()> {
        Ok(self.store.health_check().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::RegistrationOrderSeeder;
    use crate::db::MemoryStore;
    use crate::tournament::models::{MatchStatus, Slot};

    fn manager() -> TournamentManager {
        TournamentManager::with_seeder(
            Arc::new(MemoryStore::new()),
            Arc::new(RegistrationOrderSeeder),
        )
    }

    async fn register_all(manager: &TournamentManager, division: &str, names: &[&str]) {
        for name in names {
            manager
                .register_participant(NewParticipant::named(*name, division))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_first_registration_creates_no_matches() {
        let manager = manager();
        register_all(&manager, "open", &["Ana"]).await;

        assert!(manager.list_matches(Some("open")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_registration_creates_final() {
        let manager = manager();
        register_all(&manager, "open", &["Ana", "Bo"]).await;

        let matches = manager.list_matches(Some("open")).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].participant1_id, Some(1));
        assert_eq!(matches[0].participant2_id, Some(2));
        assert!(matches[0].is_ready());
    }

    #[tokio::test]
    async fn test_completing_match_advances_winner() {
        let manager = manager();
        register_all(&manager, "open", &["Ana", "Bo", "Cy", "Di"]).await;

        let view = manager.bracket("open").await.unwrap();
        let first = view.round(1)[0].clone();
        let second = view.round(1)[1].clone();

        let outcome = manager
            .update_match(first.id, MatchUpdate::complete(1))
            .await
            .unwrap();
        assert!(matches!(
            outcome.advancement,
            Some(Advancement::Placed {
                slot: Slot::First,
                ready: false,
                ..
            })
        ));

        let outcome = manager
            .update_match(second.id, MatchUpdate::complete(4))
            .await
            .unwrap();
        assert!(matches!(
            outcome.advancement,
            Some(Advancement::Placed {
                slot: Slot::Second,
                ready: true,
                ..
            })
        ));

        let final_match = manager.bracket("open").await.unwrap().round(2)[0].clone();
        assert_eq!(final_match.participant1_id, Some(1));
        assert_eq!(final_match.participant2_id, Some(4));
        assert_eq!(final_match.status, MatchStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_without_completion_does_not_advance() {
        let manager = manager();
        register_all(&manager, "open", &["Ana", "Bo", "Cy", "Di"]).await;
        let first = manager.bracket("open").await.unwrap().round(1)[0].clone();

        let outcome = manager
            .update_match(first.id, MatchUpdate::status(MatchStatus::InProgress))
            .await
            .unwrap();

        assert!(outcome.advancement.is_none());
        assert_eq!(outcome.updated.status, MatchStatus::InProgress);
        let final_match = manager.bracket("open").await.unwrap().round(2)[0].clone();
        assert_eq!(final_match.participant1_id, None);
    }

    #[tokio::test]
    async fn test_completion_requires_winner_from_the_match() {
        let manager = manager();
        register_all(&manager, "open", &["Ana", "Bo", "Cy", "Di"]).await;
        let first = manager.bracket("open").await.unwrap().round(1)[0].clone();

        let missing = manager
            .update_match(first.id, MatchUpdate::status(MatchStatus::Completed))
            .await;
        assert!(matches!(missing, Err(TournamentError::MissingWinner(id)) if id == first.id));

        let outsider = manager
            .update_match(first.id, MatchUpdate::complete(3))
            .await;
        assert!(matches!(
            outsider,
            Err(TournamentError::InvalidWinner { winner_id: 3, .. })
        ));

        let unchanged = manager.get_match(first.id).await.unwrap();
        assert_eq!(unchanged.status, MatchStatus::Pending);
        assert_eq!(unchanged.winner_id, None);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let manager = manager();

        assert!(matches!(
            manager.update_match(99, MatchUpdate::complete(1)).await,
            Err(TournamentError::MatchNotFound(99))
        ));
        assert!(matches!(
            manager.delete_match(99).await,
            Err(TournamentError::MatchNotFound(99))
        ));
        assert!(matches!(
            manager
                .update_participant(99, ParticipantUpdate::default())
                .await,
            Err(TournamentError::ParticipantNotFound(99))
        ));
        assert!(matches!(
            manager.remove_participant(99).await,
            Err(TournamentError::ParticipantNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_resolve_byes_is_idempotent() {
        let manager = manager();
        register_all(&manager, "open", &["Ana", "Bo", "Cy"]).await;

        let first_pass = manager.resolve_byes("open").await.unwrap();
        assert_eq!(first_pass.len(), 1);
        assert!(matches!(
            first_pass[0],
            Advancement::Placed {
                slot: Slot::Second,
                ..
            }
        ));

        let second_pass = manager.resolve_byes("open").await.unwrap();
        assert!(matches!(second_pass[0], Advancement::SlotOccupied { .. }));

        let final_match = manager.bracket("open").await.unwrap().round(2)[0].clone();
        assert_eq!(final_match.participant1_id, None);
        assert_eq!(final_match.participant2_id, Some(3));
    }

    fn move_to(division: &str) -> ParticipantUpdate {
        ParticipantUpdate {
            division: Some(division.to_string()),
            ..ParticipantUpdate::default()
        }
    }

    #[tokio::test]
    async fn test_division_change_rebuilds_both_divisions() {
        let manager = manager();
        register_all(&manager, "open", &["Ana", "Bo", "Cy"]).await;
        register_all(&manager, "junior", &["Di"]).await;

        let moved = manager.update_participant(3, move_to("junior")).await.unwrap();
        assert_eq!(moved.division, "junior");

        let junior = manager.list_matches(Some("junior")).await.unwrap();
        assert_eq!(junior.len(), 1);
        assert!(junior[0].has_participant(3));
        assert!(junior[0].has_participant(4));

        let open = manager.list_matches(Some("open")).await.unwrap();
        assert_eq!(open.len(), 1, "Two players left should meet in a final");
        assert!(open.iter().all(|m| !m.has_participant(3)));
    }

    #[tokio::test]
    async fn test_division_change_clears_abandoned_bracket() {
        let manager = manager();
        register_all(&manager, "open", &["Ana", "Bo"]).await;

        manager.update_participant(2, move_to("junior")).await.unwrap();

        assert!(manager.list_matches(Some("open")).await.unwrap().is_empty());
        assert!(manager.list_matches(Some("junior")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_opposite_moves_do_not_deadlock() {
        let manager = manager();
        register_all(&manager, "open", &["Ana", "Bo", "Cy"]).await;
        register_all(&manager, "junior", &["Di", "Ed", "Flo"]).await;

        let (to_junior, to_open) = tokio::join!(
            manager.update_participant(1, move_to("junior")),
            manager.update_participant(4, move_to("open")),
        );
        to_junior.unwrap();
        to_open.unwrap();

        for (division, member, absent) in [("open", 4, 1), ("junior", 1, 4)] {
            let matches = manager.list_matches(Some(division)).await.unwrap();
            assert!(matches.iter().any(|m| m.has_participant(member)));
            assert!(matches.iter().all(|m| !m.has_participant(absent)));
        }
    }

    #[tokio::test]
    async fn test_slot_edit_on_completed_match_keeps_winner_valid() {
        let manager = manager();
        register_all(&manager, "open", &["Ana", "Bo", "Cy", "Di"]).await;
        let first = manager.bracket("open").await.unwrap().round(1)[0].clone();
        manager
            .update_match(first.id, MatchUpdate::complete(1))
            .await
            .unwrap();

        let replace_winner = MatchUpdate {
            participant1_id: Some(Some(99)),
            ..MatchUpdate::default()
        };
        assert!(matches!(
            manager.update_match(first.id, replace_winner).await,
            Err(TournamentError::InvalidWinner { winner_id: 1, .. })
        ));

        let clear_winner = MatchUpdate {
            winner_id: Some(None),
            ..MatchUpdate::default()
        };
        assert!(matches!(
            manager.update_match(first.id, clear_winner).await,
            Err(TournamentError::MissingWinner(_))
        ));

        let stored = manager.get_match(first.id).await.unwrap();
        assert_eq!(stored.participant1_id, Some(1));
        assert_eq!(stored.winner_id, Some(1));

        let swap_loser = MatchUpdate {
            participant2_id: Some(Some(5)),
            ..MatchUpdate::default()
        };
        let outcome = manager.update_match(first.id, swap_loser).await.unwrap();
        assert_eq!(outcome.updated.participant2_id, Some(5));
    }

    #[tokio::test]
    async fn test_create_match_checks_position() {
        let manager = manager();

        for (round, match_number) in [
            (0, 1),
            (1, 0),
            (MAX_ROUNDS + 1, 1),
            (u32::MAX, 1),
            (1, MAX_MATCH_NUMBER + 1),
        ] {
            let result = manager
                .create_match(NewMatch::placeholder("exhibition", round, match_number))
                .await;
            assert!(
                matches!(result, Err(TournamentError::InvalidMatch(_))),
                "round {} match {} should be rejected",
                round,
                match_number
            );
        }
        assert!(manager.list_matches(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deepest_round_bracket_view() {
        let manager = manager();
        manager
            .create_match(NewMatch::placeholder("exhibition", MAX_ROUNDS, 1))
            .await
            .unwrap();

        let view = manager.bracket("exhibition").await.unwrap();
        assert_eq!(view.total_rounds, MAX_ROUNDS);
        assert_eq!(view.bracket_size, 1usize << MAX_ROUNDS);
        assert_eq!(view.rounds.len(), 1);
        assert_eq!(view.round(MAX_ROUNDS).len(), 1);
    }

    #[tokio::test]
    async fn test_create_match_checks_result() {
        let manager = manager();

        let no_winner = NewMatch {
            status: MatchStatus::Completed,
            ..NewMatch::paired("exhibition", 1, 1, 2)
        };
        assert!(matches!(
            manager.create_match(no_winner).await,
            Err(TournamentError::InvalidMatch(_))
        ));

        let outsider = NewMatch {
            winner_id: Some(7),
            status: MatchStatus::Completed,
            ..NewMatch::paired("exhibition", 1, 1, 2)
        };
        assert!(matches!(
            manager.create_match(outsider).await,
            Err(TournamentError::InvalidMatch(_))
        ));

        let decided = NewMatch {
            winner_id: Some(2),
            status: MatchStatus::Completed,
            ..NewMatch::paired("exhibition", 1, 1, 2)
        };
        let created = manager.create_match(decided).await.unwrap();
        assert_eq!(created.winner_id, Some(2));
    }

    #[tokio::test]
    async fn test_bracket_view_reports_champion() {
        let manager = manager();
        register_all(&manager, "open", &["Ana", "Bo"]).await;

        let view = manager.bracket("open").await.unwrap();
        assert_eq!(view.bracket_size, 2);
        assert_eq!(view.total_rounds, 1);
        assert_eq!(view.champion, None);

        let final_match = view.round(1)[0].clone();
        let outcome = manager
            .update_match(final_match.id, MatchUpdate::complete(2))
            .await
            .unwrap();
        assert_eq!(
            outcome.advancement,
            Some(Advancement::Champion { winner: 2 })
        );

        let view = manager.bracket("open").await.unwrap();
        assert_eq!(view.champion, Some(2));
    }

    #[tokio::test]
    async fn test_empty_division_bracket() {
        let view = manager().bracket("nobody").await.unwrap();
        assert_eq!(view.participant_count, 0);
        assert_eq!(view.total_rounds, 0);
        assert_eq!(view.match_count(), 0);
        assert_eq!(view.champion, None);
    }
}

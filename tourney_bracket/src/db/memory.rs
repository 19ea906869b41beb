//! In-memory record store.
//!
//! Used by the test suites and by the server when started without a database.
//! Every operation runs under one write or read lock, so multi-record
//! operations like [`MatchRepository::replace_division_matches`] are atomic.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{
    errors::StoreResult,
    repository::{MatchRepository, ParticipantRepository, RecordStore},
};
use crate::tournament::models::{
    Match, MatchId, MatchStatus, MatchUpdate, NewMatch, NewParticipant, Participant,
    ParticipantId, ParticipantUpdate, Slot,
};

#[derive(Debug)]
struct MemoryState {
    participants: BTreeMap<ParticipantId, Participant>,
    matches: BTreeMap<MatchId, Match>,
    next_participant_id: ParticipantId,
    next_match_id: MatchId,
}

impl MemoryState {
    fn insert_match(&mut self, new_match: NewMatch) -> Match {
        let id = self.next_match_id;
        self.next_match_id += 1;

        let created = new_match.into_match(id, Utc::now());
        self.matches.insert(id, created.clone());
        created
    }
}

/// Record store backed by ordered maps behind a single lock
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                participants: BTreeMap::new(),
                matches: BTreeMap::new(),
                next_participant_id: 1,
                next_match_id: 1,
            }),
        }
    }

    /// Number of stored matches across all divisions
    pub async fn match_count(&self) -> usize {
        self.state.read().await.matches.len()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryStore {
    async fn insert_participant(&self, participant: NewParticipant) -> StoreResult<Participant> {
        let mut state = self.state.write().await;
        let id = state.next_participant_id;
        state.next_participant_id += 1;

        let created = participant.into_participant(id);
        state.participants.insert(id, created.clone());
        Ok(created)
    }

    async fn get_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>> {
        Ok(self.state.read().await.participants.get(&id).cloned())
    }

    async fn list_participants(&self, division: &str) -> StoreResult<Vec<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .values()
            .filter(|p| p.division == division)
            .cloned()
            .collect())
    }

    async fn list_all_participants(&self) -> StoreResult<Vec<Participant>> {
        Ok(self.state.read().await.participants.values().cloned().collect())
    }

    async fn update_participant(
        &self,
        id: ParticipantId,
        update: &ParticipantUpdate,
    ) -> StoreResult<Option<Participant>> {
        let mut state = self.state.write().await;
        Ok(state.participants.get_mut(&id).map(|participant| {
            update.apply(participant);
            participant.clone()
        }))
    }

    async fn delete_participant(&self, id: ParticipantId) -> StoreResult<bool> {
        Ok(self.state.write().await.participants.remove(&id).is_some())
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn insert_match(&self, new_match: NewMatch) -> StoreResult<Match> {
        Ok(self.state.write().await.insert_match(new_match))
    }

    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.state.read().await.matches.get(&id).cloned())
    }

    async fn list_matches(&self, division: &str) -> StoreResult<Vec<Match>> {
        let state = self.state.read().await;
        Ok(state
            .matches
            .values()
            .filter(|m| m.division == division)
            .cloned()
            .collect())
    }

    async fn list_all_matches(&self) -> StoreResult<Vec<Match>> {
        Ok(self.state.read().await.matches.values().cloned().collect())
    }

    async fn update_match(
        &self,
        id: MatchId,
        update: &MatchUpdate,
    ) -> StoreResult<Option<Match>> {
        let mut state = self.state.write().await;
        Ok(state.matches.get_mut(&id).map(|m| {
            update.apply(m);
            m.clone()
        }))
    }

    async fn delete_match(&self, id: MatchId) -> StoreResult<bool> {
        Ok(self.state.write().await.matches.remove(&id).is_some())
    }

    async fn replace_division_matches(
        &self,
        division: &str,
        matches: Vec<NewMatch>,
    ) -> StoreResult<Vec<Match>> {
        let mut state = self.state.write().await;
        state.matches.retain(|_, m| m.division != division);

        Ok(matches
            .into_iter()
            .map(|new_match| state.insert_match(new_match))
            .collect())
    }

    async fn fill_slot(
        &self,
        id: MatchId,
        slot: Slot,
        participant: ParticipantId,
    ) -> StoreResult<Option<Match>> {
        let mut state = self.state.write().await;
        let Some(target) = state.matches.get_mut(&id) else {
            return Ok(None);
        };
        if target.slot(slot).is_some() {
            return Ok(None);
        }

        target.set_slot(slot, Some(participant));
        if target.participant1_id.is_some() && target.participant2_id.is_some() {
            target.status = MatchStatus::Pending;
        }
        Ok(Some(target.clone()))
    }
}

impl RecordStore for MemoryStore {}

//! Tournament data models for participants, matches and bracket views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use thiserror::Error;

/// Participant ID type
pub type ParticipantId = i64;

/// Match ID type
pub type MatchId = i64;

/// Status string that does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Participant status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    /// Registered and playing
    #[default]
    Active,
    /// Withdrawn or disqualified by an organizer
    Inactive,
    /// Knocked out of the bracket
    Eliminated,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Active => "active",
            ParticipantStatus::Inactive => "inactive",
            ParticipantStatus::Eliminated => "eliminated",
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ParticipantStatus::Active),
            "inactive" => Ok(ParticipantStatus::Inactive),
            "eliminated" => Ok(ParticipantStatus::Eliminated),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Match status
///
/// A pending match is either still waiting for participants or ready to be
/// played; [`Match::is_ready`] tells the two apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "in_progress" => Ok(MatchStatus::InProgress),
            "completed" => Ok(MatchStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One of the two participant positions in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    First,
    Second,
}

/// Registered participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub player_name: String,
    pub discord_user: String,
    pub roblox_user: String,
    pub division: String,
    pub experience: Option<String>,
    pub score: i32,
    pub status: ParticipantStatus,
}

/// Registration request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParticipant {
    pub player_name: String,
    pub discord_user: String,
    pub roblox_user: String,
    pub division: String,
    #[serde(default)]
    pub experience: Option<String>,
}

impl NewParticipant {
    /// Registration with empty handles, mostly useful for tests and seeding scripts
    pub fn named(player_name: impl Into<String>, division: impl Into<String>) -> Self {
        let player_name = player_name.into();
        Self {
            discord_user: player_name.to_lowercase(),
            roblox_user: player_name.to_lowercase(),
            player_name,
            division: division.into(),
            experience: None,
        }
    }

    /// Build the stored record once the store has issued an identifier
    pub fn into_participant(self, id: ParticipantId) -> Participant {
        Participant {
            id,
            player_name: self.player_name,
            discord_user: self.discord_user,
            roblox_user: self.roblox_user,
            division: self.division,
            experience: self.experience.filter(|e| !e.is_empty()),
            score: 0,
            status: ParticipantStatus::Active,
        }
    }
}

/// Partial participant update
///
/// `experience` distinguishes an absent field (keep) from an explicit `null`
/// (clear).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantUpdate {
    pub player_name: Option<String>,
    pub discord_user: Option<String>,
    pub roblox_user: Option<String>,
    pub division: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub experience: Option<Option<String>>,
    pub score: Option<i32>,
    pub status: Option<ParticipantStatus>,
}

impl ParticipantUpdate {
    pub fn apply(&self, participant: &mut Participant) {
        if let Some(name) = &self.player_name {
            participant.player_name = name.clone();
        }
        if let Some(discord) = &self.discord_user {
            participant.discord_user = discord.clone();
        }
        if let Some(roblox) = &self.roblox_user {
            participant.roblox_user = roblox.clone();
        }
        if let Some(division) = &self.division {
            participant.division = division.clone();
        }
        if let Some(experience) = &self.experience {
            participant.experience = experience.clone();
        }
        if let Some(score) = self.score {
            participant.score = score;
        }
        if let Some(status) = self.status {
            participant.status = status;
        }
    }
}

/// Bracket match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub division: String,
    /// Round number, 1 is the first round
    pub round: u32,
    /// 1-based position within the round
    pub match_number: u32,
    pub participant1_id: Option<ParticipantId>,
    pub participant2_id: Option<ParticipantId>,
    pub winner_id: Option<ParticipantId>,
    /// Advisory color assignment ("red" / "black"), never read by bracket logic
    pub side: Option<String>,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn slot(&self, slot: Slot) -> Option<ParticipantId> {
        match slot {
            Slot::First => self.participant1_id,
            Slot::Second => self.participant2_id,
        }
    }

    pub fn set_slot(&mut self, slot: Slot, participant: Option<ParticipantId>) {
        match slot {
            Slot::First => self.participant1_id = participant,
            Slot::Second => self.participant2_id = participant,
        }
    }

    /// Both slots filled and the result not yet recorded
    pub fn is_ready(&self) -> bool {
        self.status == MatchStatus::Pending
            && self.participant1_id.is_some()
            && self.participant2_id.is_some()
    }

    /// First-round match with a single occupant, decided at generation
    pub fn is_bye(&self) -> bool {
        self.round == 1
            && self.status == MatchStatus::Completed
            && self.participant1_id.is_some()
            && self.participant2_id.is_none()
    }

    pub fn has_participant(&self, participant: ParticipantId) -> bool {
        self.participant1_id == Some(participant) || self.participant2_id == Some(participant)
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }
}

/// Match fields supplied on insert; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch {
    pub division: String,
    pub round: u32,
    pub match_number: u32,
    #[serde(default)]
    pub participant1_id: Option<ParticipantId>,
    #[serde(default)]
    pub participant2_id: Option<ParticipantId>,
    #[serde(default)]
    pub winner_id: Option<ParticipantId>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub status: MatchStatus,
}

impl NewMatch {
    /// First-round match between two participants
    pub fn paired(
        division: &str,
        match_number: u32,
        first: ParticipantId,
        second: ParticipantId,
    ) -> Self {
        Self {
            division: division.to_string(),
            round: 1,
            match_number,
            participant1_id: Some(first),
            participant2_id: Some(second),
            winner_id: None,
            side: None,
            status: MatchStatus::Pending,
        }
    }

    /// First-round match with a single participant, already decided
    pub fn bye(division: &str, match_number: u32, participant: ParticipantId) -> Self {
        Self {
            division: division.to_string(),
            round: 1,
            match_number,
            participant1_id: Some(participant),
            participant2_id: None,
            winner_id: Some(participant),
            side: None,
            status: MatchStatus::Completed,
        }
    }

    /// Empty later-round match waiting for winners
    pub fn placeholder(division: &str, round: u32, match_number: u32) -> Self {
        Self {
            division: division.to_string(),
            round,
            match_number,
            participant1_id: None,
            participant2_id: None,
            winner_id: None,
            side: None,
            status: MatchStatus::Pending,
        }
    }

    pub fn into_match(self, id: MatchId, created_at: DateTime<Utc>) -> Match {
        Match {
            id,
            division: self.division,
            round: self.round,
            match_number: self.match_number,
            participant1_id: self.participant1_id,
            participant2_id: self.participant2_id,
            winner_id: self.winner_id,
            side: self.side,
            status: self.status,
            created_at,
        }
    }
}

/// Partial match update
///
/// Nullable fields distinguish an absent field (keep) from an explicit `null`
/// (clear).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub participant1_id: Option<Option<ParticipantId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub participant2_id: Option<Option<ParticipantId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub winner_id: Option<Option<ParticipantId>>,
    pub status: Option<MatchStatus>,
}

impl MatchUpdate {
    /// Record a result: set the winner and mark the match completed
    pub fn complete(winner: ParticipantId) -> Self {
        Self {
            winner_id: Some(Some(winner)),
            status: Some(MatchStatus::Completed),
            ..Self::default()
        }
    }

    pub fn status(status: MatchStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether this update moves the match into `completed`
    pub fn completes(&self) -> bool {
        self.status == Some(MatchStatus::Completed)
    }

    pub fn apply(&self, m: &mut Match) {
        if let Some(p1) = self.participant1_id {
            m.participant1_id = p1;
        }
        if let Some(p2) = self.participant2_id {
            m.participant2_id = p2;
        }
        if let Some(winner) = self.winner_id {
            m.winner_id = winner;
        }
        if let Some(status) = self.status {
            m.status = status;
        }
    }
}

/// Division bracket grouped by round
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketView {
    pub division: String,
    pub participant_count: usize,
    pub bracket_size: usize,
    pub total_rounds: u32,
    /// Matches keyed by round number, each round sorted by match number
    pub rounds: BTreeMap<u32, Vec<Match>>,
    /// Winner of the final once it is completed
    pub champion: Option<ParticipantId>,
}

impl BracketView {
    pub fn match_count(&self) -> usize {
        self.rounds.values().map(Vec::len).sum()
    }

    pub fn round(&self, round: u32) -> &[Match] {
        self.rounds.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Deserialize a present-but-null field as `Some(None)`
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

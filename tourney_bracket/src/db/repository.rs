//! Repository trait definitions for testability and dependency injection.
//!
//! The bracket engine only ever talks to a [`RecordStore`]. Identifier
//! issuance belongs to the store (`BIGSERIAL` in PostgreSQL, counters behind
//! the lock in [`MemoryStore`](super::MemoryStore)).

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::errors::{StoreError, StoreResult};
use crate::tournament::models::{
    Match, MatchId, MatchStatus, MatchUpdate, NewMatch, NewParticipant, Participant,
    ParticipantId, ParticipantStatus, ParticipantUpdate, Slot,
};

/// Trait for participant repository operations
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Insert a participant and assign it a fresh ID
    async fn insert_participant(&self, participant: NewParticipant) -> StoreResult<Participant>;

    /// Find participant by ID
    async fn get_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>>;

    /// List participants of a division in registration order
    async fn list_participants(&self, division: &str) -> StoreResult<Vec<Participant>>;

    /// List every participant in registration order
    async fn list_all_participants(&self) -> StoreResult<Vec<Participant>>;

    /// Apply a partial update, `None` if the participant does not exist
    async fn update_participant(
        &self,
        id: ParticipantId,
        update: &ParticipantUpdate,
    ) -> StoreResult<Option<Participant>>;

    /// Delete a participant, `true` if a record existed
    async fn delete_participant(&self, id: ParticipantId) -> StoreResult<bool>;
}

/// Trait for match repository operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Insert a match, assigning a fresh ID and creation timestamp
    async fn insert_match(&self, new_match: NewMatch) -> StoreResult<Match>;

    /// Find match by ID
    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>>;

    /// List matches of a division in no guaranteed order
    async fn list_matches(&self, division: &str) -> StoreResult<Vec<Match>>;

    /// List every match
    async fn list_all_matches(&self) -> StoreResult<Vec<Match>>;

    /// Apply a partial update, `None` if the match does not exist
    async fn update_match(&self, id: MatchId, update: &MatchUpdate)
    -> StoreResult<Option<Match>>;

    /// Delete a match, `true` if a record existed
    async fn delete_match(&self, id: MatchId) -> StoreResult<bool>;

    /// Atomically drop every match of `division` and insert `matches`
    ///
    /// Returns the inserted matches in the given order.
    async fn replace_division_matches(
        &self,
        division: &str,
        matches: Vec<NewMatch>,
    ) -> StoreResult<Vec<Match>>;

    /// Put `participant` into `slot` of match `id` only if that slot is empty
    ///
    /// When both slots end up filled the status is reset to `pending`.
    /// Returns the updated match, or `None` when the match does not exist or
    /// the slot was already taken.
    async fn fill_slot(
        &self,
        id: MatchId,
        slot: Slot,
        participant: ParticipantId,
    ) -> StoreResult<Option<Match>>;
}

/// Everything the bracket engine needs from persistence
#[async_trait]
pub trait RecordStore: ParticipantRepository + MatchRepository {
    /// Check the backing storage is reachable
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Default PostgreSQL implementation of [`RecordStore`]
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn corrupt(table: &'static str, reason: impl ToString) -> StoreError {
    StoreError::Corrupt {
        table,
        reason: reason.to_string(),
    }
}

fn to_column(field: &'static str, value: u32) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::OutOfRange { field, value })
}

fn participant_from_row(row: &PgRow) -> StoreResult<Participant> {
    let status: String = row.try_get("status")?;

    Ok(Participant {
        id: row.try_get("id")?,
        player_name: row.try_get("player_name")?,
        discord_user: row.try_get("discord_user")?,
        roblox_user: row.try_get("roblox_user")?,
        division: row.try_get("division")?,
        experience: row.try_get("experience")?,
        score: row.try_get::<Option<i32>, _>("score")?.unwrap_or(0),
        status: status
            .parse::<ParticipantStatus>()
            .map_err(|e| corrupt("participants", e))?,
    })
}

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    let status: String = row.try_get("status")?;
    let round: i32 = row.try_get("round")?;
    let match_number: i32 = row.try_get("match_number")?;

    Ok(Match {
        id: row.try_get("id")?,
        division: row.try_get("division")?,
        round: u32::try_from(round).map_err(|e| corrupt("matches", e))?,
        match_number: u32::try_from(match_number).map_err(|e| corrupt("matches", e))?,
        participant1_id: row.try_get("participant1_id")?,
        participant2_id: row.try_get("participant2_id")?,
        winner_id: row.try_get("winner_id")?,
        side: row.try_get("side")?,
        status: status
            .parse::<MatchStatus>()
            .map_err(|e| corrupt("matches", e))?,
        created_at: row
            .try_get::<chrono::NaiveDateTime, _>("created_at")?
            .and_utc(),
    })
}

#[async_trait]
impl ParticipantRepository for PgRecordStore {
    async fn insert_participant(&self, participant: NewParticipant) -> StoreResult<Participant> {
        let row = sqlx::query(
            r#"
            INSERT INTO participants (player_name, discord_user, roblox_user, division, experience)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, player_name, discord_user, roblox_user, division, experience, score, status
            "#,
        )
        .bind(&participant.player_name)
        .bind(&participant.discord_user)
        .bind(&participant.roblox_user)
        .bind(&participant.division)
        .bind(participant.experience.as_deref().filter(|e| !e.is_empty()))
        .fetch_one(&self.pool)
        .await?;

        participant_from_row(&row)
    }

    async fn get_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>> {
        let row = sqlx::query(
            "SELECT id, player_name, discord_user, roblox_user, division, experience, score, status
             FROM participants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(participant_from_row).transpose()
    }

    async fn list_participants(&self, division: &str) -> StoreResult<Vec<Participant>> {
        let rows = sqlx::query(
            "SELECT id, player_name, discord_user, roblox_user, division, experience, score, status
             FROM participants WHERE division = $1 ORDER BY id",
        )
        .bind(division)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(participant_from_row).collect()
    }

    async fn list_all_participants(&self) -> StoreResult<Vec<Participant>> {
        let rows = sqlx::query(
            "SELECT id, player_name, discord_user, roblox_user, division, experience, score, status
             FROM participants ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(participant_from_row).collect()
    }

    async fn update_participant(
        &self,
        id: ParticipantId,
        update: &ParticipantUpdate,
    ) -> StoreResult<Option<Participant>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, player_name, discord_user, roblox_user, division, experience, score, status
             FROM participants WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut participant = participant_from_row(&row)?;
        update.apply(&mut participant);

        sqlx::query(
            r#"
            UPDATE participants
            SET player_name = $2, discord_user = $3, roblox_user = $4, division = $5,
                experience = $6, score = $7, status = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&participant.player_name)
        .bind(&participant.discord_user)
        .bind(&participant.roblox_user)
        .bind(&participant.division)
        .bind(&participant.experience)
        .bind(participant.score)
        .bind(participant.status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(participant))
    }

    async fn delete_participant(&self, id: ParticipantId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM participants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MatchRepository for PgRecordStore {
    async fn insert_match(&self, new_match: NewMatch) -> StoreResult<Match> {
        let row = sqlx::query(
            r#"
            INSERT INTO matches (division, round, match_number, participant1_id, participant2_id,
                                 winner_id, side, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, division, round, match_number, participant1_id, participant2_id,
                      winner_id, side, status, created_at
            "#,
        )
        .bind(&new_match.division)
        .bind(to_column("round", new_match.round)?)
        .bind(to_column("match_number", new_match.match_number)?)
        .bind(new_match.participant1_id)
        .bind(new_match.participant2_id)
        .bind(new_match.winner_id)
        .bind(&new_match.side)
        .bind(new_match.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        match_from_row(&row)
    }

    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        let row = sqlx::query(
            "SELECT id, division, round, match_number, participant1_id, participant2_id,
                    winner_id, side, status, created_at
             FROM matches WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_matches(&self, division: &str) -> StoreResult<Vec<Match>> {
        let rows = sqlx::query(
            "SELECT id, division, round, match_number, participant1_id, participant2_id,
                    winner_id, side, status, created_at
             FROM matches WHERE division = $1",
        )
        .bind(division)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn list_all_matches(&self) -> StoreResult<Vec<Match>> {
        let rows = sqlx::query(
            "SELECT id, division, round, match_number, participant1_id, participant2_id,
                    winner_id, side, status, created_at
             FROM matches ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn update_match(
        &self,
        id: MatchId,
        update: &MatchUpdate,
    ) -> StoreResult<Option<Match>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, division, round, match_number, participant1_id, participant2_id,
                    winner_id, side, status, created_at
             FROM matches WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut updated = match_from_row(&row)?;
        update.apply(&mut updated);

        sqlx::query(
            r#"
            UPDATE matches
            SET participant1_id = $2, participant2_id = $3, winner_id = $4, status = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(updated.participant1_id)
        .bind(updated.participant2_id)
        .bind(updated.winner_id)
        .bind(updated.status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(updated))
    }

    async fn delete_match(&self, id: MatchId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_division_matches(
        &self,
        division: &str,
        matches: Vec<NewMatch>,
    ) -> StoreResult<Vec<Match>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM matches WHERE division = $1")
            .bind(division)
            .execute(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(matches.len());
        for new_match in matches {
            let row = sqlx::query(
                r#"
                INSERT INTO matches (division, round, match_number, participant1_id,
                                     participant2_id, winner_id, side, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id, division, round, match_number, participant1_id, participant2_id,
                          winner_id, side, status, created_at
                "#,
            )
            .bind(&new_match.division)
            .bind(to_column("round", new_match.round)?)
            .bind(to_column("match_number", new_match.match_number)?)
            .bind(new_match.participant1_id)
            .bind(new_match.participant2_id)
            .bind(new_match.winner_id)
            .bind(&new_match.side)
            .bind(new_match.status.as_str())
            .fetch_one(&mut *tx)
            .await?;

            created.push(match_from_row(&row)?);
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn fill_slot(
        &self,
        id: MatchId,
        slot: Slot,
        participant: ParticipantId,
    ) -> StoreResult<Option<Match>> {
        // Conditional on the slot still being empty so concurrent fills cannot
        // overwrite each other.
        let sql = match slot {
            Slot::First => {
                r#"
                UPDATE matches
                SET participant1_id = $2,
                    status = CASE WHEN participant2_id IS NOT NULL THEN 'pending' ELSE status END
                WHERE id = $1 AND participant1_id IS NULL
                RETURNING id, division, round, match_number, participant1_id, participant2_id,
                          winner_id, side, status, created_at
                "#
            }
            Slot::Second => {
                r#"
                UPDATE matches
                SET participant2_id = $2,
                    status = CASE WHEN participant1_id IS NOT NULL THEN 'pending' ELSE status END
                WHERE id = $1 AND participant2_id IS NULL
                RETURNING id, division, round, match_number, participant1_id, participant2_id,
                          winner_id, side, status, created_at
                "#
            }
        };

        let row = sqlx::query(sql)
            .bind(id)
            .bind(participant)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

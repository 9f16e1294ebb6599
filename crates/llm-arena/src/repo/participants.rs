//! Participant repository.

use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::db::DbPool;
use crate::models::{Outcome, Participant};

/// Repository for participant records.
#[derive(Clone)]
pub struct ParticipantRepo {
    db: DbPool,
}

impl ParticipantRepo {
    /// Create a new participant repository over the given pool.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Ensure a participant exists.
    ///
    /// Inserts the participant with a fresh 1500 rating if absent;
    /// a no-op if the id is already registered.
    pub fn ensure(&self, id: &str, name: &str, provider: &str) -> SqliteResult<()> {
        let conn = self.db.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO participants (id, name, provider) VALUES (?1, ?2, ?3)",
            [id, name, provider],
        )?;
        Ok(())
    }

    /// Get a participant by id.
    pub fn get(&self, id: &str) -> SqliteResult<Option<Participant>> {
        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, provider, rating, games_played, wins, losses, draws
             FROM participants WHERE id = ?1",
        )?;
        stmt.query_row([id], Self::map_row).optional()
    }

    /// List all participants.
    pub fn list_all(&self) -> SqliteResult<Vec<Participant>> {
        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, provider, rating, games_played, wins, losses, draws
             FROM participants ORDER BY id",
        )?;
        let participants = stmt
            .query_map([], Self::map_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(participants)
    }

    /// Apply one completed game to a participant's record.
    ///
    /// Sets the new rating and bumps `games_played` plus the aggregate
    /// matching the outcome. Called exactly once per participant per
    /// completed game; the caller's status guard enforces that.
    pub fn apply_result(&self, id: &str, new_rating: i32, outcome: Outcome) -> SqliteResult<()> {
        let (wins, losses, draws) = match outcome {
            Outcome::Win => (1, 0, 0),
            Outcome::Loss => (0, 1, 0),
            Outcome::Draw => (0, 0, 1),
        };
        let conn = self.db.lock().unwrap();
        conn.execute(
            "UPDATE participants SET
                rating = ?1,
                games_played = games_played + 1,
                wins = wins + ?2,
                losses = losses + ?3,
                draws = draws + ?4
             WHERE id = ?5",
            (new_rating, wins, losses, draws, id),
        )?;
        Ok(())
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Participant> {
        Ok(Participant {
            id: row.get(0)?,
            name: row.get(1)?,
            provider: row.get(2)?,
            rating: row.get(3)?,
            games_played: row.get(4)?,
            wins: row.get(5)?,
            losses: row.get(6)?,
            draws: row.get(7)?,
        })
    }
}

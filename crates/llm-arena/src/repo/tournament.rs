//! Tournament state repository.
//!
//! The tournament table holds a single row: whether ticking is enabled
//! and how many ticks have run. Ground truth for scheduling lives here,
//! never in process memory.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::Result as SqliteResult;

use crate::db::DbPool;

/// Whether the tournament is accepting ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentStatus {
    /// Ticks are skipped.
    Stopped,
    /// Ticks advance games and matchmake.
    Running,
}

impl TournamentStatus {
    /// Database representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
        }
    }

    /// Parse the database representation.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "stopped" => Some(Self::Stopped),
            "running" => Some(Self::Running),
            _ => None,
        }
    }
}

/// Snapshot of the tournament row.
#[derive(Debug, Clone)]
pub struct TournamentState {
    /// Whether ticking is enabled.
    pub status: TournamentStatus,
    /// Number of completed ticks.
    pub tick_count: i32,
    /// RFC 3339 timestamp of the last completed tick.
    pub last_tick_at: Option<String>,
    /// RFC 3339 timestamp of the last start.
    pub started_at: Option<String>,
}

/// Repository for the single tournament state row.
#[derive(Clone)]
pub struct TournamentRepo {
    db: DbPool,
}

impl TournamentRepo {
    /// Create a new tournament repository over the given pool.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Read the current tournament state.
    pub fn state(&self) -> SqliteResult<TournamentState> {
        let conn = self.db.lock().unwrap();
        conn.query_row(
            "SELECT status, tick_count, last_tick_at, started_at FROM tournament WHERE id = 1",
            [],
            |row| {
                let status_text: String = row.get(0)?;
                let status = TournamentStatus::from_str(&status_text).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        Type::Text,
                        format!("unknown tournament status: {status_text}").into(),
                    )
                })?;
                Ok(TournamentState {
                    status,
                    tick_count: row.get(1)?,
                    last_tick_at: row.get(2)?,
                    started_at: row.get(3)?,
                })
            },
        )
    }

    /// Enable ticking.
    pub fn start(&self) -> SqliteResult<()> {
        let conn = self.db.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE tournament SET status = 'running', started_at = ?1 WHERE id = 1",
            [&now],
        )?;
        Ok(())
    }

    /// Disable ticking. In-flight games stay active and resume when
    /// the tournament starts again.
    pub fn stop(&self) -> SqliteResult<()> {
        let conn = self.db.lock().unwrap();
        conn.execute("UPDATE tournament SET status = 'stopped' WHERE id = 1", [])?;
        Ok(())
    }

    /// Wipe all games and moves and reset every participant's record.
    pub fn reset(&self) -> SqliteResult<()> {
        let conn = self.db.lock().unwrap();
        conn.execute_batch(
            "DELETE FROM moves;
             DELETE FROM games;
             UPDATE participants SET rating = 1500, games_played = 0,
                 wins = 0, losses = 0, draws = 0;
             UPDATE tournament SET status = 'stopped', tick_count = 0,
                 last_tick_at = NULL, started_at = NULL WHERE id = 1;",
        )
    }

    /// Record a completed tick. Returns the new tick count.
    pub fn record_tick(&self) -> SqliteResult<i32> {
        let conn = self.db.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE tournament SET tick_count = tick_count + 1, last_tick_at = ?1 WHERE id = 1",
            [&now],
        )?;
        conn.query_row("SELECT tick_count FROM tournament WHERE id = 1", [], |row| {
            row.get(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::models::MoveEntry;
    use crate::repo::{GameRepo, ParticipantRepo};

    fn setup() -> (TournamentRepo, DbPool) {
        let db = init_db(":memory:").expect("Failed to init db");
        (TournamentRepo::new(db.clone()), db)
    }

    #[test]
    fn test_initial_state_is_stopped() {
        let (repo, _db) = setup();
        let state = repo.state().unwrap();
        assert_eq!(state.status, TournamentStatus::Stopped);
        assert_eq!(state.tick_count, 0);
        assert!(state.last_tick_at.is_none());
    }

    #[test]
    fn test_start_and_stop() {
        let (repo, _db) = setup();
        repo.start().unwrap();
        let state = repo.state().unwrap();
        assert_eq!(state.status, TournamentStatus::Running);
        assert!(state.started_at.is_some());

        repo.stop().unwrap();
        assert_eq!(repo.state().unwrap().status, TournamentStatus::Stopped);
    }

    #[test]
    fn test_record_tick_increments() {
        let (repo, _db) = setup();
        assert_eq!(repo.record_tick().unwrap(), 1);
        assert_eq!(repo.record_tick().unwrap(), 2);
        let state = repo.state().unwrap();
        assert_eq!(state.tick_count, 2);
        assert!(state.last_tick_at.is_some());
    }

    #[test]
    fn test_reset_clears_everything() {
        let (repo, db) = setup();
        let participants = ParticipantRepo::new(db.clone());
        let games = GameRepo::new(db);
        participants.ensure("w", "W", "p").unwrap();
        participants.ensure("b", "B", "p").unwrap();
        let game_id = games.create("w", "b").unwrap();
        games
            .record_move(&MoveEntry {
                game_id: game_id.clone(),
                participant_id: "w".to_string(),
                ply: 1,
                san: "e4".to_string(),
                fen_after: "fen".to_string(),
                rationale: String::new(),
            })
            .unwrap();
        participants
            .apply_result("w", 1516, crate::models::Outcome::Win)
            .unwrap();
        repo.start().unwrap();
        repo.record_tick().unwrap();

        repo.reset().unwrap();

        assert!(games.get(&game_id).unwrap().is_none());
        let w = participants.get("w").unwrap().unwrap();
        assert_eq!(w.rating, 1500);
        assert_eq!(w.games_played, 0);
        let state = repo.state().unwrap();
        assert_eq!(state.status, TournamentStatus::Stopped);
        assert_eq!(state.tick_count, 0);
        assert!(state.started_at.is_none());
    }
}

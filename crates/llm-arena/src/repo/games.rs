//! Game repository.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{GameRecord, GameResult, GameStatus, MoveEntry};
use crate::rules::STARTING_FEN;

/// Repository for game records and their move transcripts.
#[derive(Clone)]
pub struct GameRepo {
    db: DbPool,
}

impl GameRepo {
    /// Create a new game repository over the given pool.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Create a new active game at the canonical starting position.
    ///
    /// Returns the ID of the newly created game.
    pub fn create(&self, white_id: &str, black_id: &str) -> SqliteResult<String> {
        let conn = self.db.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO games (id, white_id, black_id, fen, move_log, status, started_at)
             VALUES (?1, ?2, ?3, ?4, '', 'active', ?5)",
            (&id, white_id, black_id, STARTING_FEN, &now),
        )?;

        Ok(id)
    }

    /// Get a game by ID.
    ///
    /// Returns `None` if the game doesn't exist.
    pub fn get(&self, id: &str) -> SqliteResult<Option<GameRecord>> {
        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, white_id, black_id, fen, move_log, status, result, started_at, ended_at
             FROM games WHERE id = ?1",
        )?;
        stmt.query_row([id], Self::map_row).optional()
    }

    /// List games in the given status, oldest first.
    pub fn list_by_status(&self, status: GameStatus) -> SqliteResult<Vec<GameRecord>> {
        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, white_id, black_id, fen, move_log, status, result, started_at, ended_at
             FROM games WHERE status = ?1 ORDER BY started_at",
        )?;
        let games = stmt
            .query_map([status.as_str()], Self::map_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(games)
    }

    /// Persist a new position and move log after an accepted move.
    ///
    /// Leaves status untouched.
    pub fn update_position(&self, id: &str, fen: &str, move_log: &str) -> SqliteResult<()> {
        let conn = self.db.lock().unwrap();
        conn.execute(
            "UPDATE games SET fen = ?1, move_log = ?2 WHERE id = ?3",
            [fen, move_log, id],
        )?;
        Ok(())
    }

    /// Mark a game complete with the given result.
    ///
    /// The update is conditional on the game still being active, which
    /// makes the active→complete transition happen at most once even
    /// under duplicate scheduling. Returns whether this call performed
    /// the transition.
    pub fn complete(&self, id: &str, result: GameResult) -> SqliteResult<bool> {
        let conn = self.db.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let updated = conn.execute(
            "UPDATE games SET status = 'complete', result = ?1, ended_at = ?2
             WHERE id = ?3 AND status = 'active'",
            (result.as_str(), &now, id),
        )?;
        Ok(updated > 0)
    }

    /// Append a move to a game's transcript.
    ///
    /// The transcript is append-only; a duplicate ply for the same game
    /// violates a uniqueness constraint and surfaces as a store error.
    pub fn record_move(&self, entry: &MoveEntry) -> SqliteResult<()> {
        let conn = self.db.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO moves (game_id, participant_id, ply, san, fen_after, rationale, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                &entry.game_id,
                &entry.participant_id,
                entry.ply,
                &entry.san,
                &entry.fen_after,
                &entry.rationale,
                &now,
            ),
        )?;
        Ok(())
    }

    /// The last `limit` move texts of a game, in playing order.
    pub fn recent_moves(&self, game_id: &str, limit: usize) -> SqliteResult<Vec<String>> {
        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT san FROM moves WHERE game_id = ?1 ORDER BY ply DESC LIMIT ?2",
        )?;
        let mut moves: Vec<String> = stmt
            .query_map((game_id, limit as i64), |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        moves.reverse();
        Ok(moves)
    }

    /// The move entry at a given ply, if one has been committed.
    pub fn move_at(&self, game_id: &str, ply: i32) -> SqliteResult<Option<MoveEntry>> {
        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT game_id, participant_id, ply, san, fen_after, rationale
             FROM moves WHERE game_id = ?1 AND ply = ?2",
        )?;
        stmt.query_row((game_id, ply), |row| {
            Ok(MoveEntry {
                game_id: row.get(0)?,
                participant_id: row.get(1)?,
                ply: row.get(2)?,
                san: row.get(3)?,
                fen_after: row.get(4)?,
                rationale: row.get(5)?,
            })
        })
        .optional()
    }

    /// All moves of a game, ordered by ply.
    pub fn moves(&self, game_id: &str) -> SqliteResult<Vec<MoveEntry>> {
        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT game_id, participant_id, ply, san, fen_after, rationale
             FROM moves WHERE game_id = ?1 ORDER BY ply",
        )?;
        let moves = stmt
            .query_map([game_id], |row| {
                Ok(MoveEntry {
                    game_id: row.get(0)?,
                    participant_id: row.get(1)?,
                    ply: row.get(2)?,
                    san: row.get(3)?,
                    fen_after: row.get(4)?,
                    rationale: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(moves)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<GameRecord> {
        let status_text: String = row.get(5)?;
        let status = GameStatus::from_str(&status_text).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("unknown game status: {status_text}").into(),
            )
        })?;
        let result_text: Option<String> = row.get(6)?;
        let result = match result_text {
            Some(text) => Some(GameResult::from_str(&text).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    Type::Text,
                    format!("unknown game result: {text}").into(),
                )
            })?),
            None => None,
        };

        Ok(GameRecord {
            id: row.get(0)?,
            white_id: row.get(1)?,
            black_id: row.get(2)?,
            fen: row.get(3)?,
            move_log: row.get(4)?,
            status,
            result,
            started_at: row.get(7)?,
            ended_at: row.get(8)?,
        })
    }
}

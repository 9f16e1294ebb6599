//! Database setup for the arena.

use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Thread-safe database connection pool.
pub type DbPool = Arc<Mutex<Connection>>;

/// Initialize the database with the arena schema.
///
/// Creates all necessary tables:
/// - `participants`: model identities and their Elo records
/// - `games`: one row per contest, position stored as FEN
/// - `moves`: append-only move transcript per game
/// - `tournament`: single-row scheduler state (running flag, tick count)
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file (use `:memory:` for in-memory)
///
/// # Errors
///
/// Returns an error if the database cannot be opened or schema creation fails.
pub fn init_db<P: AsRef<Path>>(path: P) -> SqliteResult<DbPool> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS participants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            provider TEXT NOT NULL,
            rating INTEGER NOT NULL DEFAULT 1500,
            games_played INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            losses INTEGER NOT NULL DEFAULT 0,
            draws INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS games (
            id TEXT PRIMARY KEY,
            white_id TEXT NOT NULL REFERENCES participants(id),
            black_id TEXT NOT NULL REFERENCES participants(id),
            fen TEXT NOT NULL,
            move_log TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'active',
            result TEXT,
            started_at TEXT NOT NULL,
            ended_at TEXT
        );

        CREATE TABLE IF NOT EXISTS moves (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            game_id TEXT NOT NULL REFERENCES games(id),
            participant_id TEXT NOT NULL REFERENCES participants(id),
            ply INTEGER NOT NULL,
            san TEXT NOT NULL,
            fen_after TEXT NOT NULL,
            rationale TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            UNIQUE(game_id, ply)
        );

        CREATE INDEX IF NOT EXISTS idx_games_status ON games(status);
        CREATE INDEX IF NOT EXISTS idx_moves_game ON moves(game_id);

        CREATE TABLE IF NOT EXISTS tournament (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            status TEXT NOT NULL DEFAULT 'stopped',
            tick_count INTEGER NOT NULL DEFAULT 0,
            last_tick_at TEXT,
            started_at TEXT
        );

        INSERT OR IGNORE INTO tournament (id) VALUES (1);
        ",
    )?;

    Ok(Arc::new(Mutex::new(conn)))
}

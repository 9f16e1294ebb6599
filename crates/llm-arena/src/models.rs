//! Core data types shared across the arena.

use serde::{Deserialize, Serialize};

/// The side a participant plays in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// The white pieces.
    White,
    /// The black pieces.
    Black,
}

impl Color {
    /// The opposing side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Lowercase name used in prompts and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

/// Lifecycle state of a game record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// The game is in progress and advanced every tick.
    Active,
    /// The game has ended; `result` and `ended_at` are set.
    Complete,
}

impl GameStatus {
    /// Database representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Complete => "complete",
        }
    }

    /// Parse the database representation.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

/// Final result of a completed game, in standard score notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    /// White won.
    WhiteWin,
    /// Black won.
    BlackWin,
    /// The game was drawn.
    Draw,
}

impl GameResult {
    /// Database representation (`1-0`, `0-1`, `1/2-1/2`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhiteWin => "1-0",
            Self::BlackWin => "0-1",
            Self::Draw => "1/2-1/2",
        }
    }

    /// Parse the database representation.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1-0" => Some(Self::WhiteWin),
            "0-1" => Some(Self::BlackWin),
            "1/2-1/2" => Some(Self::Draw),
            _ => None,
        }
    }

    /// The result in which the given side loses.
    #[must_use]
    pub fn loss_for(color: Color) -> Self {
        match color {
            Color::White => Self::BlackWin,
            Color::Black => Self::WhiteWin,
        }
    }

    /// Outcome of this result from the perspective of one side.
    #[must_use]
    pub fn outcome_for(self, color: Color) -> Outcome {
        match (self, color) {
            (Self::Draw, _) => Outcome::Draw,
            (Self::WhiteWin, Color::White) | (Self::BlackWin, Color::Black) => Outcome::Win,
            _ => Outcome::Loss,
        }
    }
}

/// Per-side outcome of a game, used for rating updates and aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The side won.
    Win,
    /// The side lost.
    Loss,
    /// The game was drawn.
    Draw,
}

impl Outcome {
    /// Score value used by the rating formula.
    #[must_use]
    pub fn score(self) -> f64 {
        match self {
            Self::Win => 1.0,
            Self::Draw => 0.5,
            Self::Loss => 0.0,
        }
    }
}

/// A tournament participant (a model identity with its running record).
#[derive(Debug, Clone)]
pub struct Participant {
    /// Stable identifier, e.g. `openai/gpt-5.1-thinking`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Provider tag, e.g. `openai`.
    pub provider: String,
    /// Current Elo rating.
    pub rating: i32,
    /// Total completed games.
    pub games_played: i32,
    /// Completed games won.
    pub wins: i32,
    /// Completed games lost.
    pub losses: i32,
    /// Completed games drawn.
    pub draws: i32,
}

/// A single game between two participants.
#[derive(Debug, Clone)]
pub struct GameRecord {
    /// Unique game id.
    pub id: String,
    /// Participant playing white.
    pub white_id: String,
    /// Participant playing black.
    pub black_id: String,
    /// Current position as FEN. Self-describing: side to move, castling
    /// rights and move counters are all derived from this field.
    pub fen: String,
    /// Accumulated movetext, e.g. `1. e4 e5 2. Nf3`.
    pub move_log: String,
    /// Lifecycle state.
    pub status: GameStatus,
    /// Final result, set only on completion.
    pub result: Option<GameResult>,
    /// RFC 3339 creation timestamp.
    pub started_at: String,
    /// RFC 3339 completion timestamp, set only on completion.
    pub ended_at: Option<String>,
}

/// One accepted move, append-only.
#[derive(Debug, Clone)]
pub struct MoveEntry {
    /// Game this move belongs to.
    pub game_id: String,
    /// Participant that made the move.
    pub participant_id: String,
    /// Ply number, strictly increasing within a game. Derived from the
    /// pre-move position's move counter, not a separate counter, so it
    /// stays correct across restarts.
    pub ply: i32,
    /// The move in SAN.
    pub san: String,
    /// Position after the move, as FEN.
    pub fen_after: String,
    /// Rationale text reported by the oracle.
    pub rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opposite() {
        assert_eq!(Color::White.opposite(), Color::Black);
        assert_eq!(Color::Black.opposite(), Color::White);
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(GameStatus::from_str("active"), Some(GameStatus::Active));
        assert_eq!(GameStatus::from_str("complete"), Some(GameStatus::Complete));
        assert_eq!(GameStatus::from_str("pending"), None);
        assert_eq!(GameStatus::Active.as_str(), "active");
    }

    #[test]
    fn test_result_round_trip() {
        for result in [GameResult::WhiteWin, GameResult::BlackWin, GameResult::Draw] {
            assert_eq!(GameResult::from_str(result.as_str()), Some(result));
        }
        assert_eq!(GameResult::from_str("*"), None);
    }

    #[test]
    fn test_outcome_for_each_side() {
        assert_eq!(GameResult::WhiteWin.outcome_for(Color::White), Outcome::Win);
        assert_eq!(GameResult::WhiteWin.outcome_for(Color::Black), Outcome::Loss);
        assert_eq!(GameResult::BlackWin.outcome_for(Color::White), Outcome::Loss);
        assert_eq!(GameResult::BlackWin.outcome_for(Color::Black), Outcome::Win);
        assert_eq!(GameResult::Draw.outcome_for(Color::White), Outcome::Draw);
        assert_eq!(GameResult::Draw.outcome_for(Color::Black), Outcome::Draw);
    }

    #[test]
    fn test_loss_for_is_inverse() {
        assert_eq!(GameResult::loss_for(Color::White), GameResult::BlackWin);
        assert_eq!(GameResult::loss_for(Color::Black), GameResult::WhiteWin);
    }
}

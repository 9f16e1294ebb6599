//! Chess rules over FEN strings, backed by shakmaty.
//!
//! Every game stores its position as a FEN string, so all rule checks
//! here are stateless functions from FEN to an answer. The position is
//! self-describing: side to move and move counters come out of the FEN,
//! which is what makes a crashed-and-restarted tick resume safely.

use shakmaty::{
    fen::Fen, san::SanPlus, CastlingMode, Chess, Color as ShakColor, EnPassantMode, Position,
};
use thiserror::Error;

use crate::models::{Color, GameResult};

/// FEN of the canonical starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Errors from rule checking and move application.
#[derive(Error, Debug)]
pub enum RulesError {
    /// The stored position could not be parsed.
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
    /// The move text could not be parsed as SAN.
    #[error("invalid move: {0}")]
    InvalidMove(String),
    /// The move is not legal in the position.
    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// An applied move: the resulting position plus movetext bookkeeping.
#[derive(Debug, Clone)]
pub struct Applied {
    /// FEN of the position after the move.
    pub fen_after: String,
    /// The move in normalized SAN (with check/mate suffix).
    pub san: String,
    /// Movetext fragment to append to the game's move log: white moves
    /// carry the move number (`1. e4`), black moves are bare (`e5`).
    pub movetext: String,
}

fn parse_position(fen: &str) -> Result<Chess, RulesError> {
    let fen: Fen = fen
        .parse()
        .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
    fen.into_position(CastlingMode::Standard)
        .map_err(|e| RulesError::InvalidFen(format!("{e}")))
}

fn parse_san(position: &Chess, text: &str) -> Result<shakmaty::Move, RulesError> {
    let san: SanPlus = text
        .trim()
        .parse()
        .map_err(|_| RulesError::InvalidMove(text.to_string()))?;
    san.san
        .to_move(position)
        .map_err(|_| RulesError::IllegalMove(text.to_string()))
}

fn to_fen(position: &Chess) -> String {
    Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
}

/// Which side is to move in the given position.
pub fn side_to_move(fen: &str) -> Result<Color, RulesError> {
    let position = parse_position(fen)?;
    Ok(match position.turn() {
        ShakColor::White => Color::White,
        ShakColor::Black => Color::Black,
    })
}

/// All legal moves in SAN, in generator order.
pub fn legal_moves(fen: &str) -> Result<Vec<String>, RulesError> {
    let position = parse_position(fen)?;
    Ok(position
        .legal_moves()
        .iter()
        .map(|m| SanPlus::from_move(position.clone(), m).to_string())
        .collect())
}

/// Whether the move text is a legal move in the position.
///
/// Unparseable or ambiguous move text counts as illegal rather than an
/// error; only a bad FEN is an error.
pub fn is_legal(fen: &str, move_text: &str) -> Result<bool, RulesError> {
    let position = parse_position(fen)?;
    Ok(parse_san(&position, move_text).is_ok())
}

/// Apply a move to the position.
pub fn apply(fen: &str, move_text: &str) -> Result<Applied, RulesError> {
    let position = parse_position(fen)?;
    let m = parse_san(&position, move_text)?;
    let san = SanPlus::from_move(position.clone(), &m).to_string();
    let movetext = match position.turn() {
        ShakColor::White => format!("{}. {}", position.fullmoves(), san),
        ShakColor::Black => san.clone(),
    };
    let after = position
        .play(&m)
        .map_err(|_| RulesError::IllegalMove(move_text.to_string()))?;
    Ok(Applied {
        fen_after: to_fen(&after),
        san,
        movetext,
    })
}

/// Whether the position is terminal.
///
/// Covers checkmate, stalemate, insufficient material, and a move
/// clock at or past 100 halfmoves. Threefold repetition cannot be seen
/// from a single FEN and is not detected.
pub fn is_terminal(fen: &str) -> Result<bool, RulesError> {
    let position = parse_position(fen)?;
    Ok(position.is_checkmate()
        || position.is_stalemate()
        || position.is_insufficient_material()
        || position.halfmoves() >= 100)
}

/// Result of a terminal position, `None` if the game is still on.
///
/// Checkmate favors the side not to move; every other terminal state
/// is a draw.
pub fn result(fen: &str) -> Result<Option<GameResult>, RulesError> {
    let position = parse_position(fen)?;
    if position.is_checkmate() {
        return Ok(Some(match position.turn() {
            ShakColor::White => GameResult::BlackWin,
            ShakColor::Black => GameResult::WhiteWin,
        }));
    }
    if position.is_stalemate()
        || position.is_insufficient_material()
        || position.halfmoves() >= 100
    {
        return Ok(Some(GameResult::Draw));
    }
    Ok(None)
}

/// Ply number of the move about to be played, derived from the FEN's
/// fullmove counter. One-based: white's first move is ply 1.
pub fn ply_number(fen: &str) -> Result<i32, RulesError> {
    let position = parse_position(fen)?;
    let fullmove = position.fullmoves().get() as i32;
    Ok(match position.turn() {
        ShakColor::White => 2 * (fullmove - 1) + 1,
        ShakColor::Black => 2 * (fullmove - 1) + 2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Black is checkmated after 1. f3 e5 2. g4 Qh4#
    const FOOLS_MATE_FEN: &str =
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    const STALEMATE_FEN: &str = "k7/8/1Q6/8/8/8/8/7K b - - 0 1";
    const KINGS_ONLY_FEN: &str = "k7/8/8/8/8/8/8/7K w - - 0 1";

    #[test]
    fn test_starting_position_basics() {
        assert_eq!(side_to_move(STARTING_FEN).unwrap(), Color::White);
        assert_eq!(legal_moves(STARTING_FEN).unwrap().len(), 20);
        assert!(!is_terminal(STARTING_FEN).unwrap());
        assert_eq!(result(STARTING_FEN).unwrap(), None);
    }

    #[test]
    fn test_apply_e4_from_start() {
        let applied = apply(STARTING_FEN, "e4").unwrap();
        assert_eq!(
            applied.fen_after,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(applied.san, "e4");
        assert_eq!(applied.movetext, "1. e4");
        assert_eq!(side_to_move(&applied.fen_after).unwrap(), Color::Black);
    }

    #[test]
    fn test_black_movetext_has_no_number() {
        let after_e4 = apply(STARTING_FEN, "e4").unwrap();
        let after_e5 = apply(&after_e4.fen_after, "e5").unwrap();
        assert_eq!(after_e5.movetext, "e5");
    }

    #[test]
    fn test_is_legal() {
        assert!(is_legal(STARTING_FEN, "e4").unwrap());
        assert!(is_legal(STARTING_FEN, "Nf3").unwrap());
        assert!(!is_legal(STARTING_FEN, "e5").unwrap());
        assert!(!is_legal(STARTING_FEN, "Ke2").unwrap());
        assert!(!is_legal(STARTING_FEN, "not a move").unwrap());
    }

    #[test]
    fn test_apply_rejects_illegal_move() {
        assert!(matches!(
            apply(STARTING_FEN, "Qh5"),
            Err(RulesError::IllegalMove(_))
        ));
    }

    #[test]
    fn test_invalid_fen_is_an_error() {
        assert!(matches!(
            side_to_move("definitely not fen"),
            Err(RulesError::InvalidFen(_))
        ));
    }

    #[test]
    fn test_checkmate_result_favors_side_not_to_move() {
        assert!(is_terminal(FOOLS_MATE_FEN).unwrap());
        assert_eq!(result(FOOLS_MATE_FEN).unwrap(), Some(GameResult::BlackWin));
    }

    #[test]
    fn test_stalemate_is_a_draw() {
        assert!(is_terminal(STALEMATE_FEN).unwrap());
        assert_eq!(result(STALEMATE_FEN).unwrap(), Some(GameResult::Draw));
        assert!(legal_moves(STALEMATE_FEN).unwrap().is_empty());
    }

    #[test]
    fn test_insufficient_material_is_a_draw() {
        assert!(is_terminal(KINGS_ONLY_FEN).unwrap());
        assert_eq!(result(KINGS_ONLY_FEN).unwrap(), Some(GameResult::Draw));
    }

    #[test]
    fn test_move_clock_draw() {
        let fen = "k7/8/8/8/8/8/8/1R5K w - - 100 80";
        assert!(is_terminal(fen).unwrap());
        assert_eq!(result(fen).unwrap(), Some(GameResult::Draw));
    }

    #[test]
    fn test_ply_numbers_increase_by_one() {
        assert_eq!(ply_number(STARTING_FEN).unwrap(), 1);
        let after_e4 = apply(STARTING_FEN, "e4").unwrap();
        assert_eq!(ply_number(&after_e4.fen_after).unwrap(), 2);
        let after_e5 = apply(&after_e4.fen_after, "e5").unwrap();
        assert_eq!(ply_number(&after_e5.fen_after).unwrap(), 3);
        let after_nf3 = apply(&after_e5.fen_after, "Nf3").unwrap();
        assert_eq!(ply_number(&after_nf3.fen_after).unwrap(), 4);
    }

    #[test]
    fn test_fools_mate_sequence() {
        let mut fen = STARTING_FEN.to_string();
        for san in ["f3", "e5", "g4", "Qh4#"] {
            assert!(!is_terminal(&fen).unwrap());
            fen = apply(&fen, san).unwrap().fen_after;
        }
        assert_eq!(fen, FOOLS_MATE_FEN);
        assert_eq!(result(&fen).unwrap(), Some(GameResult::BlackWin));
    }
}

//! The move oracle contract.
//!
//! An oracle proposes a move for a position. The production oracle sits
//! in front of an LLM provider; tests script one; the ticker binary
//! falls back to a uniform random oracle. The caller owns retry,
//! timeout and backoff policy — an oracle is stateless per call.

use std::future::Future;

use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;

use crate::models::Color;

/// Everything an oracle gets to see when asked for a move.
#[derive(Debug, Clone)]
pub struct MoveQuery {
    /// Current position as FEN.
    pub fen: String,
    /// Side the oracle is playing.
    pub color: Color,
    /// All legal moves in SAN.
    pub legal_moves: Vec<String>,
    /// Recent move texts for context, oldest first.
    pub recent_moves: Vec<String>,
    /// Feedback about a previously rejected proposal, threaded through
    /// the retry loop.
    pub error_context: Option<String>,
}

/// A proposed move with the oracle's reasoning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveProposal {
    /// The move in SAN.
    pub san: String,
    /// Free-form rationale.
    pub rationale: String,
}

/// Ways an oracle call can fail.
///
/// None of these are fatal to a game: the advancer retries within its
/// attempt budget and resolves exhaustion as a forfeit.
#[derive(Error, Debug)]
pub enum OracleError {
    /// The call exceeded its execution timeout.
    #[error("oracle call timed out")]
    Timeout,
    /// The provider reported an error.
    #[error("provider error: {0}")]
    Provider(String),
    /// The response could not be parsed into a proposal.
    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
}

/// A move-proposing agent.
pub trait MoveOracle: Send + Sync {
    /// Propose a move for the given participant and position.
    fn propose_move(
        &self,
        participant_id: &str,
        query: &MoveQuery,
    ) -> impl Future<Output = Result<MoveProposal, OracleError>> + Send;
}

/// Render the prompt an LLM-backed oracle sends for a query.
#[must_use]
pub fn build_prompt(query: &MoveQuery) -> String {
    let recent = if query.recent_moves.is_empty() {
        "This is the first move.".to_string()
    } else {
        format!("Recent moves: {}", query.recent_moves.join(", "))
    };
    let error_context = query
        .error_context
        .as_deref()
        .map(|ctx| format!("IMPORTANT: {ctx}\n\n"))
        .unwrap_or_default();

    format!(
        "You are playing chess as {color} against another AI model.\n\
         \n\
         Current position (FEN): {fen}\n\
         {recent}\n\
         Legal moves: {legal}\n\
         \n\
         {error_context}Analyze the position and choose your move. Consider:\n\
         - Material balance\n\
         - Piece activity\n\
         - King safety\n\
         - Pawn structure\n\
         \n\
         Respond with valid JSON only:\n\
         {{\"move\": \"your_move\", \"reasoning\": \"brief explanation\"}}",
        color = query.color.as_str(),
        fen = query.fen,
        legal = query.legal_moves.join(", "),
    )
}

#[derive(Deserialize)]
struct RawProposal {
    #[serde(rename = "move")]
    san: String,
    reasoning: String,
}

/// Parse a provider response into a proposal.
///
/// Providers wrap the JSON in prose or markdown fences often enough
/// that this extracts the outermost `{...}` span before parsing.
/// Returns `None` when no valid proposal can be recovered.
#[must_use]
pub fn parse_proposal(response: &str) -> Option<MoveProposal> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    let raw: RawProposal = serde_json::from_str(&response[start..=end]).ok()?;
    Some(MoveProposal {
        san: raw.san,
        rationale: raw.reasoning,
    })
}

/// An oracle that plays a uniformly random legal move.
///
/// Used by the ticker binary when no provider is wired up, and handy
/// as a baseline opponent.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOracle;

impl RandomOracle {
    /// Create a new random oracle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MoveOracle for RandomOracle {
    async fn propose_move(
        &self,
        _participant_id: &str,
        query: &MoveQuery,
    ) -> Result<MoveProposal, OracleError> {
        let san = query
            .legal_moves
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| OracleError::Provider("no legal moves to choose from".to_string()))?;
        Ok(MoveProposal {
            san,
            rationale: "random choice".to_string(),
        })
    }
}

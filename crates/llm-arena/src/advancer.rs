//! Advancing one game by one ply.
//!
//! The advancer is where retry, forfeiture and termination policy live.
//! All coordination with other (possibly duplicate) invocations goes
//! through the store using reload-then-check: reload the record, verify
//! it is still active, and treat a mismatch as a silent no-op.

use thiserror::Error;
use tokio::time::{sleep, timeout};

use crate::config::ArenaConfig;
use crate::elo;
use crate::models::{Color, GameRecord, GameResult, GameStatus, MoveEntry};
use crate::oracle::{MoveOracle, MoveProposal, MoveQuery, OracleError};
use crate::repo::{GameRepo, ParticipantRepo};
use crate::rules::{self, RulesError};

/// Errors that abort a single game's advancement for the current tick.
///
/// Oracle failures never appear here: they are resolved inside the
/// retry loop, worst case as a forfeit. The game stays active on a
/// store error and is retried on the next tick.
#[derive(Error, Debug)]
pub enum AdvanceError {
    /// The store rejected a read or write.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    /// A stored position could not be interpreted.
    #[error(transparent)]
    Rules(#[from] RulesError),
}

/// Advances active games one ply at a time.
pub struct GameAdvancer<O> {
    games: GameRepo,
    participants: ParticipantRepo,
    oracle: O,
    config: ArenaConfig,
}

impl<O: MoveOracle> GameAdvancer<O> {
    /// Create a new advancer.
    pub fn new(
        games: GameRepo,
        participants: ParticipantRepo,
        oracle: O,
        config: ArenaConfig,
    ) -> Self {
        Self {
            games,
            participants,
            oracle,
            config,
        }
    }

    /// Advance one game by one ply. Idempotent per tick.
    ///
    /// A missing or already-complete game is a no-op, which defends
    /// against duplicate or overlapping invocations targeting the same
    /// game. If the acting side produces no legal move within the
    /// attempt budget, it forfeits.
    pub async fn advance(&self, game_id: &str) -> Result<(), AdvanceError> {
        let Some(game) = self.games.get(game_id)? else {
            return Ok(());
        };
        if game.status != GameStatus::Active {
            return Ok(());
        }

        // A terminal position under an active record means a previous
        // run stopped between the per-ply write and termination. Finish
        // the job instead of consulting the oracle.
        if rules::is_terminal(&game.fen)? {
            if let Some(result) = rules::result(&game.fen)? {
                return self.terminate(game_id, result).await;
            }
        }

        let ply = rules::ply_number(&game.fen)?;

        // A transcript entry at this ply means a previous run stopped
        // between the transcript write and the position update. Replay
        // the committed move instead of consulting the oracle, otherwise
        // the re-derived ply would collide with the transcript forever.
        if let Some(committed) = self.games.move_at(game_id, ply)? {
            tracing::info!(game_id, ply, san = %committed.san, "replaying committed move");
            let applied = rules::apply(&game.fen, &committed.san)?;
            self.games.update_position(
                game_id,
                &applied.fen_after,
                &append_movetext(&game, &applied.movetext),
            )?;
            if rules::is_terminal(&applied.fen_after)? {
                if let Some(result) = rules::result(&applied.fen_after)? {
                    self.terminate(game_id, result).await?;
                }
            }
            return Ok(());
        }

        let color = rules::side_to_move(&game.fen)?;
        let actor_id = match color {
            Color::White => game.white_id.clone(),
            Color::Black => game.black_id.clone(),
        };

        let recent_moves = self.games.recent_moves(game_id, self.config.context_moves)?;
        let legal_moves = rules::legal_moves(&game.fen)?;

        let proposal = self
            .request_legal_move(&actor_id, &game.fen, color, &legal_moves, recent_moves)
            .await;

        let Some(proposal) = proposal else {
            tracing::warn!(
                game_id,
                participant = %actor_id,
                "no legal move within attempt budget, forfeiting"
            );
            return self.terminate(game_id, GameResult::loss_for(color)).await;
        };

        let applied = match rules::apply(&game.fen, &proposal.san) {
            Ok(applied) => applied,
            Err(err) => {
                // The validator accepted the move but application still
                // failed. Forfeit so the game keeps making progress.
                tracing::warn!(game_id, error = %err, "accepted move failed to apply, forfeiting");
                return self.terminate(game_id, GameResult::loss_for(color)).await;
            }
        };

        self.games.record_move(&MoveEntry {
            game_id: game_id.to_string(),
            participant_id: actor_id,
            ply,
            san: applied.san.clone(),
            fen_after: applied.fen_after.clone(),
            rationale: proposal.rationale,
        })?;
        self.games.update_position(
            game_id,
            &applied.fen_after,
            &append_movetext(&game, &applied.movetext),
        )?;

        if rules::is_terminal(&applied.fen_after)? {
            if let Some(result) = rules::result(&applied.fen_after)? {
                self.terminate(game_id, result).await?;
            }
        }

        Ok(())
    }

    /// Ask the oracle for a move until one is legal or the attempt
    /// budget runs out.
    ///
    /// The evolving error context is the only state threaded between
    /// attempts: an illegal proposal feeds the next attempt a message
    /// naming the rejected move and restating the legal moves, while a
    /// failed call (timeout, provider, parse) leaves the context
    /// unchanged and backs off proportionally to the attempt index.
    async fn request_legal_move(
        &self,
        participant_id: &str,
        fen: &str,
        color: Color,
        legal_moves: &[String],
        recent_moves: Vec<String>,
    ) -> Option<MoveProposal> {
        let mut error_context: Option<String> = None;

        for attempt in 1..=self.config.max_move_attempts {
            let query = MoveQuery {
                fen: fen.to_string(),
                color,
                legal_moves: legal_moves.to_vec(),
                recent_moves: recent_moves.clone(),
                error_context: error_context.clone(),
            };

            let response = match timeout(
                self.config.oracle_timeout(),
                self.oracle.propose_move(participant_id, &query),
            )
            .await
            {
                Ok(response) => response,
                Err(_) => Err(OracleError::Timeout),
            };

            match response {
                Ok(proposal) => {
                    if rules::is_legal(fen, &proposal.san).unwrap_or(false) {
                        return Some(proposal);
                    }
                    tracing::debug!(
                        participant = participant_id,
                        attempt,
                        san = %proposal.san,
                        "oracle proposed an illegal move"
                    );
                    error_context = Some(format!(
                        "\"{}\" is illegal. Legal moves: {}",
                        proposal.san,
                        legal_moves.join(", ")
                    ));
                }
                Err(err) => {
                    tracing::debug!(
                        participant = participant_id,
                        attempt,
                        error = %err,
                        "oracle attempt failed"
                    );
                    if attempt < self.config.max_move_attempts {
                        sleep(self.config.backoff_for_attempt(attempt)).await;
                    }
                }
            }
        }

        None
    }

    /// Complete a game with the given result and settle both ratings.
    /// Idempotent: overlapping invocations settle at most once.
    pub async fn terminate(&self, game_id: &str, result: GameResult) -> Result<(), AdvanceError> {
        let Some(game) = self.games.get(game_id)? else {
            return Ok(());
        };
        if game.status != GameStatus::Active {
            return Ok(());
        }

        // Snapshot both ratings before computing either delta so the
        // order of application cannot bias the math.
        let Some(white) = self.participants.get(&game.white_id)? else {
            tracing::warn!(game_id, participant = %game.white_id, "white participant missing");
            return Ok(());
        };
        let Some(black) = self.participants.get(&game.black_id)? else {
            tracing::warn!(game_id, participant = %game.black_id, "black participant missing");
            return Ok(());
        };

        // The conditional status flip is what makes this idempotent:
        // only the invocation that performs the transition settles the
        // ratings.
        if !self.games.complete(game_id, result)? {
            return Ok(());
        }

        let white_outcome = result.outcome_for(Color::White);
        let black_outcome = result.outcome_for(Color::Black);
        let white_change = elo::rating_change(white.rating, black.rating, white_outcome);
        let black_change = elo::rating_change(black.rating, white.rating, black_outcome);

        self.participants
            .apply_result(&game.white_id, white_change.new_rating, white_outcome)?;
        self.participants
            .apply_result(&game.black_id, black_change.new_rating, black_outcome)?;

        tracing::info!(
            game_id,
            result = result.as_str(),
            white = %game.white_id,
            white_delta = white_change.delta,
            black = %game.black_id,
            black_delta = black_change.delta,
            "game complete"
        );

        Ok(())
    }
}

fn append_movetext(game: &GameRecord, movetext: &str) -> String {
    if game.move_log.is_empty() {
        movetext.to_string()
    } else {
        format!("{} {}", game.move_log, movetext)
    }
}

//! The tick orchestrator: one full cycle of the tournament.
//!
//! A tick advances every active game by one ply (each in isolation),
//! pairs idle participants into new games, and records the tick. It is
//! driven from outside on a fixed interval; the gate that authenticates
//! the trigger lives upstream.

use futures_util::future::join_all;
use rusqlite::Result as SqliteResult;
use serde::Serialize;

use crate::advancer::GameAdvancer;
use crate::config::ArenaConfig;
use crate::db::DbPool;
use crate::matchmaker::Matchmaker;
use crate::models::GameStatus;
use crate::oracle::MoveOracle;
use crate::repo::{GameRepo, ParticipantRepo, TournamentRepo, TournamentStatus};

/// What a completed tick reports to the trigger boundary.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Number of games that were active when the tick started,
    /// regardless of per-game outcome.
    pub games_processed: usize,
    /// Total ticks recorded so far.
    pub tick_count: i32,
    /// True when the tournament was stopped and the tick did nothing.
    pub skipped: bool,
}

/// Drives one full tournament cycle per invocation.
pub struct TickOrchestrator<O> {
    games: GameRepo,
    tournament: TournamentRepo,
    advancer: GameAdvancer<O>,
    matchmaker: Matchmaker,
}

impl<O: MoveOracle> TickOrchestrator<O> {
    /// Wire up an orchestrator over the given pool and oracle.
    pub fn new(db: DbPool, oracle: O, config: ArenaConfig) -> Self {
        let games = GameRepo::new(db.clone());
        let participants = ParticipantRepo::new(db.clone());
        let tournament = TournamentRepo::new(db);
        let matchmaker = Matchmaker::new(games.clone(), participants.clone(), config.pairing);
        let advancer = GameAdvancer::new(games.clone(), participants, oracle, config);
        Self {
            games,
            tournament,
            advancer,
            matchmaker,
        }
    }

    /// Run one tick.
    ///
    /// All active games are advanced concurrently; a failure in one
    /// game is logged and must not keep the others from being
    /// processed. A failed game stays active and is retried on the
    /// next tick.
    pub async fn run_tick(&self) -> SqliteResult<TickReport> {
        let state = self.tournament.state()?;
        if state.status != TournamentStatus::Running {
            tracing::debug!("tournament is stopped, skipping tick");
            return Ok(TickReport {
                games_processed: 0,
                tick_count: state.tick_count,
                skipped: true,
            });
        }

        let active = self.games.list_by_status(GameStatus::Active)?;
        let games_processed = active.len();

        join_all(active.iter().map(|game| self.advance_isolated(&game.id))).await;

        let created = self.matchmaker.run()?;
        let tick_count = self.tournament.record_tick()?;

        tracing::info!(tick_count, games_processed, created, "tick complete");

        Ok(TickReport {
            games_processed,
            tick_count,
            skipped: false,
        })
    }

    async fn advance_isolated(&self, game_id: &str) {
        if let Err(err) = self.advancer.advance(game_id).await {
            tracing::error!(game_id, error = %err, "game advancement failed, will retry next tick");
        }
    }
}

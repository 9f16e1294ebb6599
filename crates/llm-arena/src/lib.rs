//! LLM Arena - a round-robin chess tournament between language models.
//!
//! This crate implements the tournament's tick cycle: every tick
//! advances each active game by one ply, settles finished games into
//! Elo updates, and pairs idle participants into new games. HTTP
//! surfaces, page rendering and provider wiring live elsewhere; this
//! crate owns the state machine, the rating math, and the retry and
//! failure policy around the move oracle.
//!
//! # Modules
//!
//! - [`models`] - shared data types (participants, games, moves)
//! - [`db`] - SQLite schema and connection pool
//! - [`repo`] - single-record repositories over the store
//! - [`rules`] - chess rules over FEN strings
//! - [`elo`] - rating calculation
//! - [`oracle`] - the move oracle contract and prompt helpers
//! - [`advancer`] - one-ply game advancement with retry and forfeiture
//! - [`matchmaker`] - pairing idle participants
//! - [`tick`] - the per-tick orchestrator
//! - [`config`] - TOML configuration

pub mod advancer;
pub mod config;
pub mod db;
pub mod elo;
pub mod matchmaker;
pub mod models;
pub mod oracle;
pub mod repo;
pub mod rules;
pub mod tick;

//! LLM Arena Ticker - drives tournament ticks on a fixed interval.
//!
//! This binary is the scheduling glue around the orchestrator: it seeds
//! the configured participants, then invokes one tick per interval
//! until shut down. It plays moves through the built-in random oracle;
//! wiring a provider-backed oracle happens upstream of this binary.

use clap::Parser;
use llm_arena::config::ArenaConfig;
use llm_arena::db;
use llm_arena::oracle::RandomOracle;
use llm_arena::repo::{ParticipantRepo, TournamentRepo};
use llm_arena::tick::TickOrchestrator;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// LLM Arena Ticker - advances the tournament on a fixed interval.
#[derive(Parser)]
#[command(name = "llm-arena-ticker")]
#[command(about = "Advances the tournament on a fixed interval")]
struct Args {
    /// Path to SQLite database
    #[arg(long, default_value = "data/arena.db")]
    db: PathBuf,

    /// Path to the arena configuration file
    #[arg(long, default_value = "arena.toml")]
    config: PathBuf,

    /// Tick interval in seconds
    #[arg(long, default_value = "60")]
    tick_interval: u64,

    /// Mark the tournament as running before ticking
    #[arg(long)]
    start: bool,

    /// Wipe games and ratings before ticking
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    tracing::info!("Starting llm-arena-ticker");
    tracing::info!("Database: {:?}", args.db);
    tracing::info!("Config: {:?}", args.config);
    tracing::info!("Tick interval: {}s", args.tick_interval);

    let config = ArenaConfig::load(&args.config)?;
    let db = db::init_db(&args.db)?;

    let participants = ParticipantRepo::new(db.clone());
    for (id, entry) in &config.participants {
        participants.ensure(id, &entry.name, &entry.provider)?;
    }
    tracing::info!("Seeded {} participants", config.participants.len());

    let tournament = TournamentRepo::new(db.clone());
    if args.reset {
        tournament.reset()?;
        tracing::info!("Tournament reset");
    }
    if args.start {
        tournament.start()?;
        tracing::info!("Tournament started");
    }

    let orchestrator = TickOrchestrator::new(db, RandomOracle::new(), config);

    // Shutdown flag
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    // Spawn signal handler
    tokio::spawn(async move {
        signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
        tracing::info!("Shutdown signal received");
        shutdown_clone.store(true, Ordering::SeqCst);
    });

    // Main tick loop
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        match orchestrator.run_tick().await {
            Ok(report) => {
                tracing::info!("Tick report: {}", serde_json::to_string(&report)?);
            }
            Err(e) => {
                tracing::error!("Tick failed: {}", e);
            }
        }

        tokio::time::sleep(Duration::from_secs(args.tick_interval)).await;
    }

    tracing::info!("Ticker shutdown complete");
    Ok(())
}

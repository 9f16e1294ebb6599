//! Repositories owning single-record database operations.
//!
//! Every method here is single-record scope; no cross-record atomicity
//! is offered. Coordination between ticks happens through the
//! reload-then-check idiom in the callers, not through transactions.

mod games;
mod participants;
mod tournament;

pub use games::GameRepo;
pub use participants::ParticipantRepo;
pub use tournament::{TournamentRepo, TournamentState, TournamentStatus};

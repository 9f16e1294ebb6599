//! Matchmaking: pair idle participants into new games.
//!
//! The idle set is recomputed from a fresh store snapshot every run;
//! engagement state is never cached across ticks because ground truth
//! is the store.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Result as SqliteResult;
use serde::{Deserialize, Serialize};

use crate::models::{GameStatus, Participant};
use crate::repo::{GameRepo, ParticipantRepo};

/// How idle participants are paired each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairingPolicy {
    /// Consider every unordered idle pair without an active matchup,
    /// shuffle, and greedily pair until no participant is left that can
    /// be matched. Maximizes utilization.
    #[default]
    FullPairing,
    /// Shuffle the idle list and pair adjacent entries. Simpler, but an
    /// existing matchup between two adjacent entries leaves both idle
    /// for the tick.
    AdjacentPairs,
}

/// Pairs idle participants into new games.
pub struct Matchmaker {
    games: GameRepo,
    participants: ParticipantRepo,
    policy: PairingPolicy,
}

impl Matchmaker {
    /// Create a matchmaker with the given policy.
    pub fn new(games: GameRepo, participants: ParticipantRepo, policy: PairingPolicy) -> Self {
        Self {
            games,
            participants,
            policy,
        }
    }

    /// Run one matchmaking pass. Returns the number of games created.
    ///
    /// Never pairs a participant with itself, and never leaves a
    /// participant engaged in two active games: participants already on
    /// a side of an active game are excluded up front, and pairs picked
    /// this pass engage both members immediately.
    pub fn run(&self) -> SqliteResult<usize> {
        let active = self.games.list_by_status(GameStatus::Active)?;

        let mut engaged: HashSet<String> = HashSet::new();
        let mut matchups: HashSet<(String, String)> = HashSet::new();
        for game in &active {
            engaged.insert(game.white_id.clone());
            engaged.insert(game.black_id.clone());
            matchups.insert(matchup_key(&game.white_id, &game.black_id));
        }

        let idle: Vec<Participant> = self
            .participants
            .list_all()?
            .into_iter()
            .filter(|p| !engaged.contains(&p.id))
            .collect();

        let pairs = match self.policy {
            PairingPolicy::FullPairing => full_pairing(&idle, &matchups),
            PairingPolicy::AdjacentPairs => adjacent_pairs(&idle, &matchups),
        };

        let mut rng = rand::thread_rng();
        let mut created = 0;
        for (a, b) in pairs {
            // Independent 50/50 color assignment per game.
            let (white, black) = if rng.gen_bool(0.5) { (a, b) } else { (b, a) };
            let game_id = self.games.create(&white, &black)?;
            tracing::debug!(game_id = %game_id, white = %white, black = %black, "created game");
            created += 1;
        }

        Ok(created)
    }
}

/// Order-independent key for a matchup between two participants.
fn matchup_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Every unordered idle pair without an active matchup, shuffled, then
/// greedily reduced to a matching.
fn full_pairing(idle: &[Participant], matchups: &HashSet<(String, String)>) -> Vec<(String, String)> {
    let mut candidates: Vec<(String, String)> = Vec::new();
    for i in 0..idle.len() {
        for j in (i + 1)..idle.len() {
            if !matchups.contains(&matchup_key(&idle[i].id, &idle[j].id)) {
                candidates.push((idle[i].id.clone(), idle[j].id.clone()));
            }
        }
    }

    candidates.shuffle(&mut rand::thread_rng());

    let mut taken: HashSet<String> = HashSet::new();
    let mut pairs = Vec::new();
    for (a, b) in candidates {
        if taken.contains(&a) || taken.contains(&b) {
            continue;
        }
        taken.insert(a.clone());
        taken.insert(b.clone());
        pairs.push((a, b));
    }
    pairs
}

/// Shuffle the idle list and pair adjacent entries.
fn adjacent_pairs(
    idle: &[Participant],
    matchups: &HashSet<(String, String)>,
) -> Vec<(String, String)> {
    let mut ids: Vec<String> = idle.iter().map(|p| p.id.clone()).collect();
    ids.shuffle(&mut rand::thread_rng());

    ids.chunks(2)
        .filter(|chunk| chunk.len() == 2)
        .filter(|chunk| !matchups.contains(&matchup_key(&chunk[0], &chunk[1])))
        .map(|chunk| (chunk[0].clone(), chunk[1].clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    fn setup(policy: PairingPolicy, n: usize) -> (Matchmaker, GameRepo, ParticipantRepo) {
        let db = init_db(":memory:").expect("Failed to init db");
        let games = GameRepo::new(db.clone());
        let participants = ParticipantRepo::new(db);
        for i in 0..n {
            participants
                .ensure(&format!("m{i}"), &format!("Model {i}"), "acme")
                .unwrap();
        }
        (
            Matchmaker::new(games.clone(), participants.clone(), policy),
            games,
            participants,
        )
    }

    fn assert_engagement_invariant(games: &GameRepo) {
        let active = games.list_by_status(GameStatus::Active).unwrap();
        let mut seen = HashSet::new();
        for game in &active {
            assert_ne!(game.white_id, game.black_id, "self-paired game");
            assert!(seen.insert(game.white_id.clone()), "double engagement");
            assert!(seen.insert(game.black_id.clone()), "double engagement");
        }
    }

    #[test]
    fn test_full_pairing_pairs_everyone_possible() {
        let (matchmaker, games, _) = setup(PairingPolicy::FullPairing, 6);
        let created = matchmaker.run().unwrap();
        assert_eq!(created, 3);
        assert_engagement_invariant(&games);
    }

    #[test]
    fn test_odd_idle_count_leaves_one_out() {
        let (matchmaker, games, _) = setup(PairingPolicy::FullPairing, 5);
        let created = matchmaker.run().unwrap();
        assert_eq!(created, 2);
        assert_engagement_invariant(&games);
    }

    #[test]
    fn test_engaged_participants_are_skipped() {
        let (matchmaker, games, _) = setup(PairingPolicy::FullPairing, 4);
        games.create("m0", "m1").unwrap();

        let created = matchmaker.run().unwrap();
        assert_eq!(created, 1);
        assert_engagement_invariant(&games);

        let active = games.list_by_status(GameStatus::Active).unwrap();
        let new_game = active
            .iter()
            .find(|g| g.white_id != "m0" && g.white_id != "m1")
            .expect("new game should pair the idle participants");
        let mut sides = [new_game.white_id.as_str(), new_game.black_id.as_str()];
        sides.sort_unstable();
        assert_eq!(sides, ["m2", "m3"]);
    }

    #[test]
    fn test_no_games_with_single_idle_participant() {
        let (matchmaker, games, _) = setup(PairingPolicy::FullPairing, 1);
        assert_eq!(matchmaker.run().unwrap(), 0);
        assert!(games.list_by_status(GameStatus::Active).unwrap().is_empty());
    }

    #[test]
    fn test_invariant_holds_across_repeated_runs() {
        let (matchmaker, games, _) = setup(PairingPolicy::FullPairing, 7);
        for _ in 0..5 {
            matchmaker.run().unwrap();
            assert_engagement_invariant(&games);
        }
    }

    #[test]
    fn test_adjacent_policy_respects_invariant() {
        let (matchmaker, games, _) = setup(PairingPolicy::AdjacentPairs, 8);
        let created = matchmaker.run().unwrap();
        assert!(created <= 4);
        assert_engagement_invariant(&games);
    }

    #[test]
    fn test_pairing_policy_serde_names() {
        assert_eq!(
            serde_json::from_str::<PairingPolicy>("\"full-pairing\"").ok(),
            Some(PairingPolicy::FullPairing)
        );
        assert_eq!(
            serde_json::from_str::<PairingPolicy>("\"adjacent-pairs\"").ok(),
            Some(PairingPolicy::AdjacentPairs)
        );
    }
}

//! Elo rating calculation.
//!
//! Pure math: given the two pre-game ratings and the outcome, produce
//! the new rating and the delta. The K-factor of 32 is fixed.

use crate::models::Outcome;

const K_FACTOR: f64 = 32.0;

/// A computed rating update for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingChange {
    /// Rating after the game.
    pub new_rating: i32,
    /// Signed points gained or lost.
    pub delta: i32,
}

/// Expected score for a player rated `rating` against `opponent_rating`.
fn expected_score(rating: i32, opponent_rating: i32) -> f64 {
    1.0 / (1.0 + 10_f64.powf(f64::from(opponent_rating - rating) / 400.0))
}

/// Compute the rating change for one side of a completed game.
///
/// Both sides of a game must be computed from the pre-update ratings
/// so that the order of application cannot bias the math.
#[must_use]
pub fn rating_change(rating: i32, opponent_rating: i32, outcome: Outcome) -> RatingChange {
    let expected = expected_score(rating, opponent_rating);
    let delta = (K_FACTOR * (outcome.score() - expected)).round() as i32;
    RatingChange {
        new_rating: rating + delta,
        delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_score_equal_ratings() {
        let expected = expected_score(1500, 1500);
        assert!((expected - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_expected_score_higher_rated() {
        let expected = expected_score(1700, 1500);
        assert!(expected > 0.7);
        assert!(expected < 0.8);
    }

    #[test]
    fn test_equal_ratings_win() {
        let change = rating_change(1500, 1500, Outcome::Win);
        assert_eq!(change.delta, 16);
        assert_eq!(change.new_rating, 1516);
    }

    #[test]
    fn test_equal_ratings_loss() {
        let change = rating_change(1500, 1500, Outcome::Loss);
        assert_eq!(change.delta, -16);
        assert_eq!(change.new_rating, 1484);
    }

    #[test]
    fn test_equal_ratings_draw() {
        let change = rating_change(1500, 1500, Outcome::Draw);
        assert_eq!(change.delta, 0);
        assert_eq!(change.new_rating, 1500);
    }

    #[test]
    fn test_upset_bonus() {
        // A win against a higher-rated opponent pays more than the
        // mirror-image win against a lower-rated one. Gaps are wide
        // enough that the rounded deltas stay apart.
        for (low, high) in [(1300, 1500), (1400, 1600), (1000, 2000)] {
            let underdog = rating_change(low, high, Outcome::Win);
            let favorite = rating_change(high, low, Outcome::Win);
            assert!(
                underdog.delta > favorite.delta,
                "expected upset bonus for {low} beating {high}"
            );
        }
    }

    #[test]
    fn test_narrow_gap_favors_underdog_before_rounding() {
        // With a 10-point gap both rounded deltas collapse to 16, but
        // the expected scores must still order the sides.
        assert!(expected_score(1450, 1460) < 0.5);
        assert!(expected_score(1450, 1460) < expected_score(1460, 1450));
    }

    #[test]
    fn test_deterministic() {
        let a = rating_change(1623, 1498, Outcome::Draw);
        let b = rating_change(1623, 1498, Outcome::Draw);
        assert_eq!(a, b);
    }
}

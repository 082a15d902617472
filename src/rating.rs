use crate::gaussian;
use crate::types::{Player, RatingPolicy};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Result of a single match from player one's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Player1Wins,
    Player2Wins,
    Draw,
}

/// Where the pre-match rating gap puts the nominal winner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapClass {
    /// Winner rated more than the threshold above the loser
    Favourite,
    /// Winner rated more than the threshold below the loser
    Underdog,
    Close,
}

impl GapClass {
    pub fn classify(winner_rating: i32, loser_rating: i32, threshold: i32) -> Self {
        if winner_rating.saturating_sub(threshold) > loser_rating {
            GapClass::Favourite
        } else if loser_rating.saturating_sub(threshold) > winner_rating {
            GapClass::Underdog
        } else {
            GapClass::Close
        }
    }
}

/// Rating deltas `(winner, loser)`. For draws "winner" is just the first
/// player. Deltas always sum to zero.
pub fn update_elo(
    policy: &RatingPolicy,
    winner_rating: i32,
    loser_rating: i32,
    draw: bool,
) -> (i32, i32) {
    let gap = GapClass::classify(winner_rating, loser_rating, policy.gap_threshold);
    let delta = match (draw, gap) {
        (true, GapClass::Favourite) => -policy.draw_delta,
        (true, GapClass::Underdog) => policy.draw_delta,
        (true, GapClass::Close) => 0,
        (false, GapClass::Favourite) => policy.expected_win_delta,
        (false, GapClass::Underdog) => policy.upset_win_delta,
        (false, GapClass::Close) => policy.close_win_delta,
    };
    (delta, -delta)
}

/// Sample a match performance: `inconsistency * z + ability`
pub fn perform(player: &Player, rng: &mut impl Rng) -> f64 {
    player.inconsistency * gaussian::normal(rng) + player.ability
}

/// Decisive only when one performance beats the other by more than `margin`
pub fn decide_outcome(perf1: f64, perf2: f64, margin: f64) -> Outcome {
    if perf1 - margin > perf2 {
        Outcome::Player1Wins
    } else if perf2 - margin > perf1 {
        Outcome::Player2Wins
    } else {
        Outcome::Draw
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchReport {
    pub outcome: Outcome,
    pub upset: bool,
}

/// Apply a decided outcome to both ratings
pub fn apply_outcome(
    p1: &mut Player,
    p2: &mut Player,
    outcome: Outcome,
    policy: &RatingPolicy,
) -> MatchReport {
    let (winner, loser, draw) = match outcome {
        Outcome::Player1Wins => (p1, p2, false),
        Outcome::Player2Wins => (p2, p1, false),
        Outcome::Draw => (p1, p2, true),
    };

    let upset = !draw
        && GapClass::classify(winner.rating, loser.rating, policy.gap_threshold)
            == GapClass::Underdog;

    let (win_delta, lose_delta) = update_elo(policy, winner.rating, loser.rating, draw);
    // Saturate at the i32 edges instead of wrapping into the wrong bucket
    winner.rating = winner.rating.saturating_add(win_delta);
    loser.rating = loser.rating.saturating_add(lose_delta);

    MatchReport { outcome, upset }
}

/// Play one match: fresh performance noise for both players, then the
/// fixed-step rating update
pub fn resolve_match(
    p1: &mut Player,
    p2: &mut Player,
    policy: &RatingPolicy,
    draw_margin: f64,
    rng: &mut impl Rng,
) -> MatchReport {
    let perf1 = perform(p1, rng);
    let perf2 = perform(p2, rng);
    let outcome = decide_outcome(perf1, perf2, draw_margin);
    apply_outcome(p1, p2, outcome, policy)
}

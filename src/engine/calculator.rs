//! Points calculation: base points through the multiplier chain, with one
//! final rounding per output.

use crate::domain::Points;
use crate::engine::multipliers::ResolvedMultipliers;

/// Base points for a win. System B is deliberately conservative; these are
/// constants, not per-call parameters.
pub const WIN_BASE_POINTS: i64 = 3;
/// Base points for a loss.
pub const LOSS_BASE_POINTS: i64 = 1;

/// Reward points per ranking point, applied per transaction to the freshly
/// computed ranking delta, never to a lifetime total.
pub fn reward_ratio() -> Points {
    Points::from_cents(150)
}

pub fn base_points(won: bool) -> Points {
    if won {
        Points::from_int(WIN_BASE_POINTS)
    } else {
        Points::from_int(LOSS_BASE_POINTS)
    }
}

/// Deltas produced for one participant of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deltas {
    pub ranking: Points,
    pub reward: Points,
}

/// ranking = round2(base x chain product); reward = round2(ranking x 1.5).
///
/// Rounding happens exactly once per output, after the full chain, so a
/// multi-stage chain cannot accumulate per-stage rounding drift. A 0.00
/// ranking delta is a valid result and still gets recorded.
pub fn match_deltas(base: Points, chain: &ResolvedMultipliers) -> Deltas {
    let ranking = (base * chain.product()).round2();
    let reward = (ranking * reward_ratio()).round2();
    Deltas { ranking, reward }
}

/// Reward-only delta for a currency purchase, from the normalized amount.
pub fn purchase_reward(normalized_amount: Points, purchase_rate: Points) -> Points {
    (normalized_amount * purchase_rate).round2()
}

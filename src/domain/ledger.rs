//! Participant ledger: cached cumulative totals plus the profile fields
//! multiplier resolution needs.

use crate::domain::{AgePool, Gender, PlayerId, Points, TimeMs};
use serde::{Deserialize, Serialize};

/// One participant's cumulative record.
///
/// Created on the first credited transaction, mutated only by additive
/// deltas, never deleted. Totals are non-negative 2dp decimals. The pool is
/// `None` until the first scored match assigns it; a purchase-only ledger
/// belongs to no pool yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantLedger {
    pub player_id: PlayerId,
    pub pool: Option<AgePool>,
    pub ranking_points: Points,
    pub reward_points: Points,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub created_at: TimeMs,
    pub updated_at: TimeMs,
}

impl ParticipantLedger {
    /// Fresh zero-total ledger seeded from a reported profile.
    pub fn seed(
        player_id: PlayerId,
        pool: Option<AgePool>,
        age: Option<u32>,
        gender: Option<Gender>,
        now: TimeMs,
    ) -> Self {
        Self {
            player_id,
            pool,
            ranking_points: Points::zero(),
            reward_points: Points::zero(),
            age,
            gender,
            created_at: now,
            updated_at: now,
        }
    }
}

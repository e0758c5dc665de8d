//! Domain types for match scoring and the additive points ledger.
//!
//! This module provides:
//! - Exact decimal point values via the Points wrapper
//! - Domain primitives: ids, tiers, formats, pools, TimeMs
//! - Immutable MatchResult input with structural validation
//! - Append-only PointsTransaction with deterministic idempotency keys
//! - ParticipantLedger snapshot type

pub mod ledger;
pub mod match_result;
pub mod points;
pub mod primitives;
pub mod transaction;

pub use ledger::ParticipantLedger;
pub use match_result::{MatchParticipant, MatchResult, MatchSide};
pub use points::Points;
pub use primitives::{
    AgePool, CurrencyCode, Gender, MatchFormat, MatchId, PlayerId, TimeMs, TournamentTier,
};
pub use transaction::{
    compute_idempotency_key, AppliedMultiplier, PointsTransaction, TransactionType,
};

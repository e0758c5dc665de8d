//! Validated match-result input.
//!
//! A match result is a fact recorded by the upstream match recorder. Identity
//! and score legality are its responsibility; this module only checks the
//! structure the engine itself depends on. Once accepted, a result is never
//! mutated.

use crate::domain::{AgePool, Gender, MatchFormat, MatchId, PlayerId, TournamentTier};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One player as reported on a match result.
///
/// Reported age/gender seed the ledger on a player's first credited
/// transaction; once a ledger exists its stored profile takes precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchParticipant {
    pub player_id: PlayerId,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

/// One side of a match: its players and the side score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSide {
    pub players: Vec<MatchParticipant>,
    pub score: u32,
}

/// A recorded match result, immutable once accepted for scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: MatchId,
    pub tier: TournamentTier,
    pub format: MatchFormat,
    pub pool: AgePool,
    pub sides: [MatchSide; 2],
    /// Index into `sides` (0 or 1).
    pub winning_side: usize,
}

impl MatchResult {
    /// Check the structural invariants the engine relies on.
    ///
    /// # Errors
    /// Returns `InvalidMatchResult` for a bad winner index, wrong side sizes
    /// for the declared format, duplicate player ids, or empty player ids.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.winning_side > 1 {
            return Err(EngineError::InvalidMatchResult(format!(
                "winning_side must be 0 or 1, got {}",
                self.winning_side
            )));
        }

        let expected = self.format.side_size();
        for (idx, side) in self.sides.iter().enumerate() {
            if side.players.len() != expected {
                return Err(EngineError::InvalidMatchResult(format!(
                    "side {} has {} players, {} format requires {}",
                    idx,
                    side.players.len(),
                    self.format,
                    expected
                )));
            }
        }

        let mut seen = HashSet::new();
        for participant in self.participants() {
            if participant.player_id.as_str().trim().is_empty() {
                return Err(EngineError::InvalidMatchResult(
                    "empty player id".to_string(),
                ));
            }
            if !seen.insert(participant.player_id.clone()) {
                return Err(EngineError::InvalidMatchResult(format!(
                    "player {} appears more than once",
                    participant.player_id
                )));
            }
        }

        Ok(())
    }

    /// All participants across both sides, side 0 first.
    pub fn participants(&self) -> impl Iterator<Item = &MatchParticipant> {
        self.sides.iter().flat_map(|s| s.players.iter())
    }

    /// Whether the given player is on the winning side.
    ///
    /// Returns `None` if the player is not part of this match.
    pub fn is_winner(&self, player_id: &PlayerId) -> Option<bool> {
        for (idx, side) in self.sides.iter().enumerate() {
            if side.players.iter().any(|p| &p.player_id == player_id) {
                return Some(idx == self.winning_side);
            }
        }
        None
    }

    /// Side index (0 or 1) for the given player, if present.
    pub fn side_of(&self, player_id: &PlayerId) -> Option<usize> {
        self.sides
            .iter()
            .position(|side| side.players.iter().any(|p| &p.player_id == player_id))
    }
}

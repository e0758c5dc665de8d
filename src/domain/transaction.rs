//! Points transactions: the append-only audit record of every delta.

use crate::domain::{PlayerId, Points, TimeMs};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of credit a transaction represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Per-participant credit from a scored match.
    Match,
    /// Reward-only credit from a currency purchase.
    Purchase,
    /// Explicit signed correction of a prior transaction. Still additive.
    Reversal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Match => "match",
            TransactionType::Purchase => "purchase",
            TransactionType::Reversal => "reversal",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "match" => Ok(TransactionType::Match),
            "purchase" => Ok(TransactionType::Purchase),
            "reversal" => Ok(TransactionType::Reversal),
            _ => Err(()),
        }
    }
}

/// One applied multiplier, preserved in order for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMultiplier {
    pub name: String,
    pub value: Points,
}

impl AppliedMultiplier {
    pub fn new(name: impl Into<String>, value: Points) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One row of the transaction log: a single delta applied to one participant.
///
/// Never updated or deleted. The participant ledger total is a cached sum of
/// these rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsTransaction {
    /// Row identity, assigned by this engine.
    pub transaction_id: Uuid,
    /// Deterministic duplicate-rejection key; unique in the log.
    pub idempotency_key: String,
    /// Source match or purchase identifier from the upstream collaborator.
    pub source_id: String,
    pub player_id: PlayerId,
    pub transaction_type: TransactionType,
    /// Base points before the multiplier chain (or the normalized amount for
    /// purchases).
    pub base_points: Points,
    /// Ordered multiplier breakdown, as applied.
    pub multipliers: Vec<AppliedMultiplier>,
    pub ranking_delta: Points,
    pub reward_delta: Points,
    pub time_ms: TimeMs,
}

impl PointsTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_id: impl Into<String>,
        player_id: PlayerId,
        transaction_type: TransactionType,
        base_points: Points,
        multipliers: Vec<AppliedMultiplier>,
        ranking_delta: Points,
        reward_delta: Points,
        time_ms: TimeMs,
    ) -> Self {
        let source_id = source_id.into();
        let idempotency_key = compute_idempotency_key(&source_id, &player_id, transaction_type);
        Self {
            transaction_id: Uuid::new_v4(),
            idempotency_key,
            source_id,
            player_id,
            transaction_type,
            base_points,
            multipliers,
            ranking_delta,
            reward_delta,
            time_ms,
        }
    }
}

/// Deterministic key for (source, participant, type).
///
/// SHA-256 over length-prefixed fields, truncated to 128 bits. The birthday
/// bound leaves ample collision margin for any realistic transaction volume,
/// and length prefixing keeps distinct field splits from colliding.
pub fn compute_idempotency_key(
    source_id: &str,
    player_id: &PlayerId,
    transaction_type: TransactionType,
) -> String {
    use sha2::{Digest, Sha256};

    fn hash_var(hasher: &mut Sha256, data: &str) {
        hasher.update((data.len() as u32).to_le_bytes());
        hasher.update(data.as_bytes());
    }

    let mut hasher = Sha256::new();
    hash_var(&mut hasher, source_id);
    hash_var(&mut hasher, player_id.as_str());
    hash_var(&mut hasher, transaction_type.as_str());

    let hash = hasher.finalize();
    format!("txk:{}", hex::encode(&hash[..16]))
}

//! Scoring service: the engine's external interface.
//!
//! Orchestrates validate -> snapshot -> resolve -> calculate -> apply for
//! matches, purchases and reversals. The calculation stages are pure; the
//! repository's atomic apply is the only point of serialization.

use crate::config::RulesConfig;
use crate::db::{ReconcileReport, Repository};
use crate::domain::{
    compute_idempotency_key, AgePool, AppliedMultiplier, CurrencyCode, MatchResult,
    ParticipantLedger, PlayerId, Points, PointsTransaction, TimeMs, TransactionType,
};
use crate::engine::{base_points, calculator, match_deltas, resolve};
use crate::error::EngineError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of applying (or replaying) one transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreOutcome {
    pub transaction: PointsTransaction,
    /// True when this was a replay: the stored transaction is returned and
    /// no state changed.
    pub already_applied: bool,
}

pub struct ScoringService {
    repo: Arc<Repository>,
    rules: RulesConfig,
}

impl ScoringService {
    pub fn new(repo: Arc<Repository>, rules: RulesConfig) -> Self {
        Self { repo, rules }
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Score a validated match result: one transaction per participant.
    ///
    /// Idempotent per (match id, participant): replays return the stored
    /// transaction flagged `already_applied` and leave the ledger untouched.
    ///
    /// # Errors
    /// `InvalidMatchResult`, `IncompleteParticipantProfile`, or storage
    /// failures. Duplicate submissions are not errors.
    pub async fn score_match(
        &self,
        match_result: &MatchResult,
    ) -> Result<Vec<ScoreOutcome>, EngineError> {
        match_result.validate()?;

        let snapshots = self.load_snapshots(match_result).await?;
        let resolved = resolve(match_result, &snapshots, &self.rules)?;

        let mut outcomes = Vec::with_capacity(resolved.len());
        for chain in &resolved {
            let won = match_result.is_winner(&chain.player_id).ok_or_else(|| {
                EngineError::Internal(format!(
                    "resolved participant {} not found in match",
                    chain.player_id
                ))
            })?;
            let base = base_points(won);
            let deltas = match_deltas(base, chain);

            let tx = PointsTransaction::new(
                match_result.match_id.as_str(),
                chain.player_id.clone(),
                TransactionType::Match,
                base,
                chain.multipliers.clone(),
                deltas.ranking,
                deltas.reward,
                TimeMs::now(),
            );

            let snapshot = snapshots
                .get(&chain.player_id)
                .ok_or_else(|| EngineError::Internal("snapshot vanished".to_string()))?;
            let outcome = self
                .apply(tx, Some(match_result.pool), snapshot.age, snapshot.gender)
                .await?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Credit reward points for a currency purchase. No ranking points.
    ///
    /// Idempotent per (purchase id, participant).
    ///
    /// # Errors
    /// `UnknownCurrency` for unlisted codes; `NegativeBalanceRejected` for a
    /// negative amount (only reversals may carry negative deltas).
    pub async fn score_purchase(
        &self,
        purchase_id: &str,
        player_id: &PlayerId,
        amount: Points,
        currency: &CurrencyCode,
    ) -> Result<ScoreOutcome, EngineError> {
        let rates = &self.rules.exchange_rates;
        let normalized = rates.normalize(amount, currency)?;
        let reward = calculator::purchase_reward(normalized, self.rules.purchase_rate);

        let rate = rates
            .rate(currency)
            .ok_or_else(|| EngineError::UnknownCurrency(currency.as_str().to_string()))?;
        let multipliers = vec![
            AppliedMultiplier::new(format!("exchange_rate:{}", currency), rate),
            AppliedMultiplier::new("purchase_rate", self.rules.purchase_rate),
        ];

        let tx = PointsTransaction::new(
            purchase_id,
            player_id.clone(),
            TransactionType::Purchase,
            normalized,
            multipliers,
            Points::zero().round2(),
            reward,
            TimeMs::now(),
        );

        // A purchase-first participant gets a ledger with no pool and no
        // profile; their first scored match assigns the pool and backfills
        // age/gender. A purchase must never pin a player to a pool.
        let existing = self.repo.get_ledger(player_id).await?;
        let pool = existing.as_ref().and_then(|l| l.pool);
        let (age, gender) = existing
            .as_ref()
            .map(|l| (l.age, l.gender))
            .unwrap_or((None, None));

        self.apply(tx, pool, age, gender).await
    }

    /// Issue an explicit reversal of a previously applied Match or Purchase
    /// transaction: a new additive transaction with negated deltas.
    ///
    /// Idempotent per (source id, participant): a source can be reversed at
    /// most once.
    ///
    /// # Errors
    /// `NotFound` when no original transaction exists;
    /// `NegativeBalanceRejected` when the ledger no longer covers the
    /// negated deltas.
    pub async fn reverse(
        &self,
        source_id: &str,
        player_id: &PlayerId,
    ) -> Result<ScoreOutcome, EngineError> {
        let original = self.find_original(source_id, player_id).await?;

        let tx = PointsTransaction::new(
            source_id,
            player_id.clone(),
            TransactionType::Reversal,
            original.base_points,
            original.multipliers.clone(),
            -original.ranking_delta,
            -original.reward_delta,
            TimeMs::now(),
        );

        let ledger = self.repo.get_ledger(player_id).await?.ok_or_else(|| {
            EngineError::NotFound(format!("no ledger for participant {}", player_id))
        })?;
        self.apply(tx, ledger.pool, ledger.age, ledger.gender).await
    }

    /// Read one participant's ledger.
    ///
    /// # Errors
    /// `NotFound` when the participant was never credited.
    pub async fn get_ledger(&self, player_id: &PlayerId) -> Result<ParticipantLedger, EngineError> {
        self.repo
            .get_ledger(player_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("no ledger for participant {}", player_id)))
    }

    /// Full transaction history for a participant, oldest first.
    pub async fn transactions(
        &self,
        player_id: &PlayerId,
    ) -> Result<Vec<PointsTransaction>, EngineError> {
        Ok(self.repo.list_transactions(player_id).await?)
    }

    /// Compare the cached ledger against the summed transaction log.
    ///
    /// # Errors
    /// `NotFound` when the participant was never credited.
    pub async fn reconcile(&self, player_id: &PlayerId) -> Result<ReconcileReport, EngineError> {
        let report = self.repo.reconcile(player_id).await?.ok_or_else(|| {
            EngineError::NotFound(format!("no ledger for participant {}", player_id))
        })?;
        if !report.consistent() {
            warn!(
                "Ledger drift for {}: ledger ({}, {}) vs log ({}, {})",
                player_id,
                report.ledger_ranking,
                report.ledger_reward,
                report.log_ranking,
                report.log_reward
            );
        }
        Ok(report)
    }

    /// Apply one transaction, converting the idempotency-guard signal into a
    /// replay outcome.
    async fn apply(
        &self,
        tx: PointsTransaction,
        pool: Option<AgePool>,
        age: Option<u32>,
        gender: Option<crate::domain::Gender>,
    ) -> Result<ScoreOutcome, EngineError> {
        // Only an explicit reversal may carry negative deltas.
        if tx.transaction_type != TransactionType::Reversal
            && (tx.ranking_delta.is_negative() || tx.reward_delta.is_negative())
        {
            return Err(EngineError::NegativeBalanceRejected {
                player_id: tx.player_id.as_str().to_string(),
            });
        }

        match self.repo.apply_delta(&tx, pool, age, gender).await {
            Ok(()) => {
                info!(
                    "Applied {} transaction {} for {}: ranking {} reward {}",
                    tx.transaction_type,
                    tx.idempotency_key,
                    tx.player_id,
                    tx.ranking_delta,
                    tx.reward_delta
                );
                Ok(ScoreOutcome {
                    transaction: tx,
                    already_applied: false,
                })
            }
            Err(EngineError::AlreadyApplied { idempotency_key }) => {
                let stored = self
                    .repo
                    .find_transaction(&idempotency_key)
                    .await?
                    .ok_or_else(|| {
                        EngineError::Internal(format!(
                            "idempotency key {} hit but transaction not found",
                            idempotency_key
                        ))
                    })?;
                info!(
                    "Replay of {} for {}: returning stored transaction",
                    idempotency_key, stored.player_id
                );
                Ok(ScoreOutcome {
                    transaction: stored,
                    already_applied: true,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Build read-only ledger snapshots for every participant, seeding new
    /// participants from the reported profile and enforcing pool isolation.
    async fn load_snapshots(
        &self,
        match_result: &MatchResult,
    ) -> Result<HashMap<PlayerId, ParticipantLedger>, EngineError> {
        let mut snapshots = HashMap::new();
        for participant in match_result.participants() {
            let snapshot = match self.repo.get_ledger(&participant.player_id).await? {
                Some(mut ledger) => {
                    // A pool-less ledger (purchase-only so far) joins the
                    // pool of its first scored match.
                    if let Some(pool) = ledger.pool {
                        if pool != match_result.pool {
                            return Err(EngineError::InvalidMatchResult(format!(
                                "participant {} belongs to the {} pool, match is {}",
                                participant.player_id, pool, match_result.pool
                            )));
                        }
                    }
                    // Stored profile wins; reported values only fill gaps.
                    ledger.age = ledger.age.or(participant.age);
                    ledger.gender = ledger.gender.or(participant.gender);
                    ledger
                }
                None => ParticipantLedger::seed(
                    participant.player_id.clone(),
                    Some(match_result.pool),
                    participant.age,
                    participant.gender,
                    TimeMs::now(),
                ),
            };
            snapshots.insert(participant.player_id.clone(), snapshot);
        }
        Ok(snapshots)
    }

    async fn find_original(
        &self,
        source_id: &str,
        player_id: &PlayerId,
    ) -> Result<PointsTransaction, EngineError> {
        for tx_type in [TransactionType::Match, TransactionType::Purchase] {
            let key = compute_idempotency_key(source_id, player_id, tx_type);
            if let Some(tx) = self.repo.find_transaction(&key).await? {
                return Ok(tx);
            }
        }
        Err(EngineError::NotFound(format!(
            "no transaction for source {} and participant {}",
            source_id, player_id
        )))
    }
}

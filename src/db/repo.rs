//! Repository: the additive ledger, the idempotency guard and the
//! append-only transaction log.
//!
//! This is the only writer of participant ledger rows. The sole mutation
//! primitive is `apply_delta`, an atomic increment plus log append inside a
//! single SQLite transaction. Increments commute, so concurrent deltas for
//! the same participant never lose an update.

use crate::domain::{
    AgePool, Gender, ParticipantLedger, PlayerId, Points, PointsTransaction, TimeMs,
    TransactionType,
};
use crate::error::EngineError;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

pub struct Repository {
    pool: SqlitePool,
}

/// Ledger totals versus the summed transaction log, for drift detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub player_id: PlayerId,
    pub ledger_ranking: Points,
    pub ledger_reward: Points,
    pub log_ranking: Points,
    pub log_reward: Points,
}

impl ReconcileReport {
    /// True when the cached ledger equals the sum of logged deltas.
    pub fn consistent(&self) -> bool {
        self.ledger_ranking == self.log_ranking && self.ledger_reward == self.log_reward
    }
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Apply one transaction: append the log row and increment the ledger,
    /// atomically.
    ///
    /// The ledger row is created on first credit, seeded with the reported
    /// profile. The increment is `current + delta` in SQL, never a
    /// replacement, and is floor-guarded so totals cannot go negative.
    /// Pool, age and gender backfill NULL ledger fields but never overwrite
    /// stored values, so a purchase-first player's first match completes
    /// their record.
    ///
    /// # Errors
    /// - `AlreadyApplied` when the idempotency key is already logged; state
    ///   is left untouched.
    /// - `NegativeBalanceRejected` when the delta would drive either total
    ///   below zero.
    pub async fn apply_delta(
        &self,
        tx: &PointsTransaction,
        pool: Option<AgePool>,
        age: Option<u32>,
        gender: Option<Gender>,
    ) -> Result<(), EngineError> {
        let ranking_cents = tx.ranking_delta.to_cents().ok_or_else(|| {
            EngineError::Internal(format!(
                "ranking delta {} is not rounded to 2 decimals",
                tx.ranking_delta
            ))
        })?;
        let reward_cents = tx.reward_delta.to_cents().ok_or_else(|| {
            EngineError::Internal(format!(
                "reward delta {} is not rounded to 2 decimals",
                tx.reward_delta
            ))
        })?;

        let multipliers_json = serde_json::to_string(&tx.multipliers)
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        let now_ms = TimeMs::now().as_ms();

        let mut db_tx = self.pool.begin().await.map_err(EngineError::from)?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO participant_ledgers
                (player_id, pool, ranking_cents, reward_cents, age, gender, created_at, updated_at)
            VALUES (?, ?, 0, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.player_id.as_str())
        .bind(pool.map(|p| p.to_string()))
        .bind(age)
        .bind(gender.map(|g| g.to_string()))
        .bind(now_ms)
        .bind(now_ms)
        .execute(&mut *db_tx)
        .await
        .map_err(EngineError::from)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO points_transactions (
                idempotency_key, transaction_id, source_id, player_id,
                transaction_type, base_points, multipliers,
                ranking_delta, reward_delta, ranking_delta_cents, reward_delta_cents,
                time_ms, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(idempotency_key) DO NOTHING
            "#,
        )
        .bind(tx.idempotency_key.as_str())
        .bind(tx.transaction_id.to_string())
        .bind(tx.source_id.as_str())
        .bind(tx.player_id.as_str())
        .bind(tx.transaction_type.as_str())
        .bind(tx.base_points.to_canonical_string())
        .bind(&multipliers_json)
        .bind(tx.ranking_delta.to_canonical_string())
        .bind(tx.reward_delta.to_canonical_string())
        .bind(ranking_cents)
        .bind(reward_cents)
        .bind(tx.time_ms.as_ms())
        .bind(now_ms)
        .execute(&mut *db_tx)
        .await
        .map_err(EngineError::from)?;

        if inserted.rows_affected() == 0 {
            db_tx.rollback().await.map_err(EngineError::from)?;
            return Err(EngineError::AlreadyApplied {
                idempotency_key: tx.idempotency_key.clone(),
            });
        }

        let updated = sqlx::query(
            r#"
            UPDATE participant_ledgers
            SET ranking_cents = ranking_cents + ?,
                reward_cents = reward_cents + ?,
                pool = COALESCE(pool, ?),
                age = COALESCE(age, ?),
                gender = COALESCE(gender, ?),
                updated_at = ?
            WHERE player_id = ?
              AND ranking_cents + ? >= 0
              AND reward_cents + ? >= 0
            "#,
        )
        .bind(ranking_cents)
        .bind(reward_cents)
        .bind(pool.map(|p| p.to_string()))
        .bind(age)
        .bind(gender.map(|g| g.to_string()))
        .bind(now_ms)
        .bind(tx.player_id.as_str())
        .bind(ranking_cents)
        .bind(reward_cents)
        .execute(&mut *db_tx)
        .await
        .map_err(EngineError::from)?;

        if updated.rows_affected() == 0 {
            db_tx.rollback().await.map_err(EngineError::from)?;
            return Err(EngineError::NegativeBalanceRejected {
                player_id: tx.player_id.as_str().to_string(),
            });
        }

        db_tx.commit().await.map_err(EngineError::from)?;
        Ok(())
    }

    /// Read one participant's ledger.
    ///
    /// # Errors
    /// Returns an error if the query fails or the row does not decode.
    pub async fn get_ledger(
        &self,
        player_id: &PlayerId,
    ) -> Result<Option<ParticipantLedger>, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT player_id, pool, ranking_cents, reward_cents, age, gender,
                   created_at, updated_at
            FROM participant_ledgers
            WHERE player_id = ?
            "#,
        )
        .bind(player_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_ledger(&r)).transpose()
    }

    /// Look up a logged transaction by its idempotency key.
    ///
    /// # Errors
    /// Returns an error if the query fails or the row does not decode.
    pub async fn find_transaction(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<PointsTransaction>, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT idempotency_key, transaction_id, source_id, player_id,
                   transaction_type, base_points, multipliers,
                   ranking_delta, reward_delta, time_ms
            FROM points_transactions
            WHERE idempotency_key = ?
            "#,
        )
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_transaction(&r)).transpose()
    }

    /// All logged transactions for a participant, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or any row does not decode.
    pub async fn list_transactions(
        &self,
        player_id: &PlayerId,
    ) -> Result<Vec<PointsTransaction>, EngineError> {
        let rows = sqlx::query(
            r#"
            SELECT idempotency_key, transaction_id, source_id, player_id,
                   transaction_type, base_points, multipliers,
                   ranking_delta, reward_delta, time_ms
            FROM points_transactions
            WHERE player_id = ?
            ORDER BY time_ms ASC, created_at ASC, idempotency_key ASC
            "#,
        )
        .bind(player_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// Sum the log's deltas for one participant and compare to the cached
    /// ledger totals.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn reconcile(
        &self,
        player_id: &PlayerId,
    ) -> Result<Option<ReconcileReport>, EngineError> {
        let ledger = match self.get_ledger(player_id).await? {
            Some(l) => l,
            None => return Ok(None),
        };

        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(ranking_delta_cents), 0) AS ranking_sum,
                   COALESCE(SUM(reward_delta_cents), 0) AS reward_sum
            FROM points_transactions
            WHERE player_id = ?
            "#,
        )
        .bind(player_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        let log_ranking = Points::from_cents(row.get::<i64, _>("ranking_sum"));
        let log_reward = Points::from_cents(row.get::<i64, _>("reward_sum"));

        Ok(Some(ReconcileReport {
            player_id: player_id.clone(),
            ledger_ranking: ledger.ranking_points,
            ledger_reward: ledger.reward_points,
            log_ranking,
            log_reward,
        }))
    }
}

fn corrupt(table: &str, field: &str, raw: &str) -> EngineError {
    EngineError::Internal(format!("corrupt {} in {} row: {}", field, table, raw))
}

fn row_to_ledger(row: &SqliteRow) -> Result<ParticipantLedger, EngineError> {
    let pool = row
        .get::<Option<String>, _>("pool")
        .map(|s| AgePool::from_str(&s).map_err(|_| corrupt("participant_ledgers", "pool", &s)))
        .transpose()?;
    let gender = row
        .get::<Option<String>, _>("gender")
        .map(|s| Gender::from_str(&s).map_err(|_| corrupt("participant_ledgers", "gender", &s)))
        .transpose()?;

    Ok(ParticipantLedger {
        player_id: PlayerId::new(row.get::<String, _>("player_id")),
        pool,
        ranking_points: Points::from_cents(row.get("ranking_cents")),
        reward_points: Points::from_cents(row.get("reward_cents")),
        age: row.get::<Option<i64>, _>("age").map(|a| a as u32),
        gender,
        created_at: TimeMs::new(row.get("created_at")),
        updated_at: TimeMs::new(row.get("updated_at")),
    })
}

// The log is the dispute-resolution record; a value that no longer parses
// must surface as an error, never be coerced to a default.
fn row_to_transaction(row: &SqliteRow) -> Result<PointsTransaction, EngineError> {
    let transaction_id: String = row.get("transaction_id");
    let type_str: String = row.get("transaction_type");
    let multipliers_json: String = row.get("multipliers");
    let base_points: String = row.get("base_points");
    let ranking_delta: String = row.get("ranking_delta");
    let reward_delta: String = row.get("reward_delta");

    Ok(PointsTransaction {
        transaction_id: Uuid::parse_str(&transaction_id)
            .map_err(|_| corrupt("points_transactions", "transaction_id", &transaction_id))?,
        idempotency_key: row.get("idempotency_key"),
        source_id: row.get("source_id"),
        player_id: PlayerId::new(row.get::<String, _>("player_id")),
        transaction_type: TransactionType::from_str(&type_str)
            .map_err(|_| corrupt("points_transactions", "transaction_type", &type_str))?,
        base_points: Points::from_str(&base_points)
            .map_err(|_| corrupt("points_transactions", "base_points", &base_points))?,
        multipliers: serde_json::from_str(&multipliers_json)
            .map_err(|_| corrupt("points_transactions", "multipliers", &multipliers_json))?,
        ranking_delta: Points::from_str(&ranking_delta)
            .map_err(|_| corrupt("points_transactions", "ranking_delta", &ranking_delta))?,
        reward_delta: Points::from_str(&reward_delta)
            .map_err(|_| corrupt("points_transactions", "reward_delta", &reward_delta))?,
        time_ms: TimeMs::new(row.get("time_ms")),
    })
}

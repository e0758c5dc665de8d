use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::matches::TransactionDto;
use crate::api::AppState;
use crate::domain::{ParticipantLedger, PlayerId};
use crate::error::EngineError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    pub player_id: String,
    /// Absent until the player's first scored match assigns a pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    pub ranking_points: String,
    pub reward_points: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl LedgerResponse {
    fn from_ledger(ledger: &ParticipantLedger) -> Self {
        LedgerResponse {
            player_id: ledger.player_id.as_str().to_string(),
            pool: ledger.pool.map(|p| p.to_string()),
            ranking_points: ledger.ranking_points.to_canonical_string(),
            reward_points: ledger.reward_points.to_canonical_string(),
            age: ledger.age,
            gender: ledger.gender.map(|g| g.to_string()),
            created_at_ms: ledger.created_at.as_ms(),
            updated_at_ms: ledger.updated_at.as_ms(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    pub player_id: String,
    pub transaction_count: i64,
    pub transactions: Vec<TransactionDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub player_id: String,
    pub ledger_ranking: String,
    pub ledger_reward: String,
    pub log_ranking: String,
    pub log_reward: String,
    pub consistent: bool,
}

pub async fn get_ledger(
    Path(player_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LedgerResponse>, EngineError> {
    let ledger = state.service.get_ledger(&PlayerId::new(player_id)).await?;
    Ok(Json(LedgerResponse::from_ledger(&ledger)))
}

pub async fn get_transactions(
    Path(player_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TransactionsResponse>, EngineError> {
    let player_id = PlayerId::new(player_id);
    let transactions = state.service.transactions(&player_id).await?;

    Ok(Json(TransactionsResponse {
        player_id: player_id.as_str().to_string(),
        transaction_count: transactions.len() as i64,
        transactions: transactions
            .iter()
            .map(|tx| TransactionDto::from_transaction(tx, None))
            .collect(),
    }))
}

pub async fn get_reconciliation(
    Path(player_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ReconcileResponse>, EngineError> {
    let report = state.service.reconcile(&PlayerId::new(player_id)).await?;

    Ok(Json(ReconcileResponse {
        player_id: report.player_id.as_str().to_string(),
        ledger_ranking: report.ledger_ranking.to_canonical_string(),
        ledger_reward: report.ledger_reward.to_canonical_string(),
        log_ranking: report.log_ranking.to_canonical_string(),
        log_reward: report.log_reward.to_canonical_string(),
        consistent: report.consistent(),
    }))
}

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::matches::TransactionDto;
use crate::api::AppState;
use crate::domain::{CurrencyCode, PlayerId, Points};
use crate::error::EngineError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub purchase_id: String,
    pub player_id: String,
    /// Decimal amount as a string, parsed losslessly.
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub transaction: TransactionDto,
}

pub async fn score_purchase(
    State(state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, EngineError> {
    if req.purchase_id.trim().is_empty() {
        return Err(EngineError::BadRequest(
            "purchaseId must not be empty".to_string(),
        ));
    }
    let amount = Points::from_str_canonical(&req.amount)
        .map_err(|_| EngineError::BadRequest(format!("invalid amount: {}", req.amount)))?;

    let outcome = state
        .service
        .score_purchase(
            &req.purchase_id,
            &PlayerId::new(req.player_id),
            amount,
            &CurrencyCode::new(req.currency),
        )
        .await?;

    Ok(Json(PurchaseResponse {
        transaction: TransactionDto::from_outcome(&outcome),
    }))
}

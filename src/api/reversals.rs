use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::matches::TransactionDto;
use crate::api::AppState;
use crate::domain::PlayerId;
use crate::error::EngineError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalRequest {
    /// Match or purchase id whose credit is being reversed.
    pub source_id: String,
    pub player_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalResponse {
    pub transaction: TransactionDto,
}

pub async fn create_reversal(
    State(state): State<AppState>,
    Json(req): Json<ReversalRequest>,
) -> Result<Json<ReversalResponse>, EngineError> {
    if req.source_id.trim().is_empty() {
        return Err(EngineError::BadRequest(
            "sourceId must not be empty".to_string(),
        ));
    }

    let outcome = state
        .service
        .reverse(&req.source_id, &PlayerId::new(req.player_id))
        .await?;

    Ok(Json(ReversalResponse {
        transaction: TransactionDto::from_outcome(&outcome),
    }))
}

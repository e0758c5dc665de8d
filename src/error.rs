use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Engine error taxonomy.
///
/// Every rejected operation surfaces to the caller; nothing is recovered
/// silently. `AlreadyApplied` is a safe no-op signal rather than a true
/// failure; the scoring service catches it and returns the previously
/// stored transaction.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("Incomplete participant profile for {player_id}: missing {missing}")]
    IncompleteParticipantProfile { player_id: String, missing: String },
    #[error("Transaction already applied: {idempotency_key}")]
    AlreadyApplied { idempotency_key: String },
    #[error("Delta rejected: would drive ledger for {player_id} below zero")]
    NegativeBalanceRejected { player_id: String },
    #[error("Invalid match result: {0}")]
    InvalidMatchResult(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Internal(err.to_string())
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::UnknownCurrency(_)
            | EngineError::IncompleteParticipantProfile { .. }
            | EngineError::InvalidMatchResult(_)
            | EngineError::BadRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::AlreadyApplied { .. } | EngineError::NegativeBalanceRejected { .. } => {
                StatusCode::CONFLICT
            }
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

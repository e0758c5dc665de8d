pub mod health;
pub mod ledgers;
pub mod matches;
pub mod purchases;
pub mod reversals;

use crate::scoring::ScoringService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScoringService>,
}

impl AppState {
    pub fn new(service: Arc<ScoringService>) -> Self {
        Self { service }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/matches/score", post(matches::score_match))
        .route("/v1/purchases", post(purchases::score_purchase))
        .route("/v1/reversals", post(reversals::create_reversal))
        .route("/v1/ledgers/:player_id", get(ledgers::get_ledger))
        .route(
            "/v1/ledgers/:player_id/transactions",
            get(ledgers::get_transactions),
        )
        .route(
            "/v1/ledgers/:player_id/reconcile",
            get(ledgers::get_reconciliation),
        )
        .layer(cors)
        .with_state(state)
}

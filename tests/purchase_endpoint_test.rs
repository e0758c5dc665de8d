use anyhow::Result;
use axum::http::StatusCode;
use matchpoints::{api, db::init_db, Repository, RulesConfig, ScoringService};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let service = Arc::new(ScoringService::new(repo, RulesConfig::system_b()));
    let app = api::create_router(api::AppState::new(service));

    TestApp {
        app,
        _temp: temp_dir,
    }
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn purchase(purchase_id: &str, player_id: &str, amount: &str, currency: &str) -> Value {
    json!({
        "purchaseId": purchase_id,
        "playerId": player_id,
        "amount": amount,
        "currency": currency
    })
}

#[tokio::test]
async fn test_reference_currency_purchase_credits_rewards_only() -> Result<()> {
    let test = setup_test_app().await;

    let (status, body) = post_json(
        &test.app,
        "/v1/purchases",
        purchase("pur-1", "p1", "100", "USD"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let tx = &body["transaction"];
    assert_eq!(tx["transactionType"], "purchase");
    assert_eq!(tx["rankingDelta"], "0");
    assert_eq!(tx["rewardDelta"], "100");
    assert_eq!(tx["alreadyApplied"], false);

    let (_, ledger) = get(&test.app, "/v1/ledgers/p1").await;
    assert_eq!(ledger["rankingPoints"], "0");
    assert_eq!(ledger["rewardPoints"], "100");
    Ok(())
}

#[tokio::test]
async fn test_weak_currency_yields_fewer_rewards_than_reference() -> Result<()> {
    let test = setup_test_app().await;

    // SEK has a 0.092 reference rate in the default table: 100 SEK must not
    // mint anywhere near 100 reward points.
    let (status, weak) = post_json(
        &test.app,
        "/v1/purchases",
        purchase("pur-weak", "p1", "100", "SEK"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(weak["transaction"]["rewardDelta"], "9.2");

    let (status, strong) = post_json(
        &test.app,
        "/v1/purchases",
        purchase("pur-strong", "p2", "100", "USD"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(strong["transaction"]["rewardDelta"], "100");
    Ok(())
}

#[tokio::test]
async fn test_unknown_currency_is_rejected() -> Result<()> {
    let test = setup_test_app().await;

    let (status, body) = post_json(
        &test.app,
        "/v1/purchases",
        purchase("pur-2", "p1", "100", "XXX"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("XXX"));

    let (status, _) = get(&test.app, "/v1/ledgers/p1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_purchase_is_a_safe_replay() -> Result<()> {
    let test = setup_test_app().await;
    let req = purchase("pur-3", "p1", "50", "USD");

    let (status, _) = post_json(&test.app, "/v1/purchases", req.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, replay) = post_json(&test.app, "/v1/purchases", req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replay["transaction"]["alreadyApplied"], true);

    let (_, ledger) = get(&test.app, "/v1/ledgers/p1").await;
    assert_eq!(ledger["rewardPoints"], "50");

    let (_, history) = get(&test.app, "/v1/ledgers/p1/transactions").await;
    assert_eq!(history["transactionCount"], 1);
    Ok(())
}

#[tokio::test]
async fn test_negative_amount_is_rejected() -> Result<()> {
    let test = setup_test_app().await;

    let (status, _) = post_json(
        &test.app,
        "/v1/purchases",
        purchase("pur-4", "p1", "-10", "USD"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn test_invalid_amount_is_rejected() -> Result<()> {
    let test = setup_test_app().await;

    let (status, _) = post_json(
        &test.app,
        "/v1/purchases",
        purchase("pur-5", "p1", "ten dollars", "USD"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_purchase_reversal_restores_ledger() -> Result<()> {
    let test = setup_test_app().await;

    post_json(
        &test.app,
        "/v1/purchases",
        purchase("pur-6", "p1", "100", "USD"),
    )
    .await;

    let (status, body) = post_json(
        &test.app,
        "/v1/reversals",
        json!({"sourceId": "pur-6", "playerId": "p1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction"]["transactionType"], "reversal");
    assert_eq!(body["transaction"]["rewardDelta"], "-100");

    let (_, ledger) = get(&test.app, "/v1/ledgers/p1").await;
    assert_eq!(ledger["rewardPoints"], "0");

    // A second reversal of the same source is a replay, not a double debit.
    let (status, body) = post_json(
        &test.app,
        "/v1/reversals",
        json!({"sourceId": "pur-6", "playerId": "p1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction"]["alreadyApplied"], true);

    let (_, ledger) = get(&test.app, "/v1/ledgers/p1").await;
    assert_eq!(ledger["rewardPoints"], "0");
    Ok(())
}

#[tokio::test]
async fn test_purchase_first_player_joins_pool_on_first_match() -> Result<()> {
    let test = setup_test_app().await;

    let (status, _) = post_json(
        &test.app,
        "/v1/purchases",
        purchase("pur-k", "kid", "10", "USD"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A purchase must not pin the player to a pool.
    let (_, ledger) = get(&test.app, "/v1/ledgers/kid").await;
    assert!(ledger.get("pool").is_none());

    let youth_match = json!({
        "matchId": "ym-1",
        "tier": "club",
        "format": "singles",
        "pool": "youth",
        "sides": [
            {"players": [{"playerId": "kid", "age": 13, "gender": "female"}], "score": 2},
            {"players": [{"playerId": "kid2", "age": 14, "gender": "female"}], "score": 0}
        ],
        "winningSide": 0
    });
    let (status, _) = post_json(&test.app, "/v1/matches/score", youth_match).await;
    assert_eq!(status, StatusCode::OK);

    let (_, ledger) = get(&test.app, "/v1/ledgers/kid").await;
    assert_eq!(ledger["pool"], "youth");
    assert_eq!(ledger["rankingPoints"], "3");
    assert_eq!(ledger["rewardPoints"], "14.5");
    Ok(())
}

#[tokio::test]
async fn test_first_match_persists_profile_after_purchase() -> Result<()> {
    let test = setup_test_app().await;

    post_json(
        &test.app,
        "/v1/purchases",
        purchase("pur-7", "p1", "20", "USD"),
    )
    .await;

    let (_, ledger) = get(&test.app, "/v1/ledgers/p1").await;
    assert!(ledger.get("age").is_none());
    assert!(ledger.get("gender").is_none());

    let first_match = json!({
        "matchId": "bm-1",
        "tier": "club",
        "format": "singles",
        "pool": "adult",
        "sides": [
            {"players": [{"playerId": "p1", "age": 28, "gender": "female"}], "score": 2},
            {"players": [{"playerId": "p2", "age": 30, "gender": "female"}], "score": 0}
        ],
        "winningSide": 0
    });
    let (status, _) = post_json(&test.app, "/v1/matches/score", first_match).await;
    assert_eq!(status, StatusCode::OK);

    let (_, ledger) = get(&test.app, "/v1/ledgers/p1").await;
    assert_eq!(ledger["age"], 28);
    assert_eq!(ledger["gender"], "female");

    // The stored profile now carries later matches that omit it.
    let second_match = json!({
        "matchId": "bm-2",
        "tier": "club",
        "format": "singles",
        "pool": "adult",
        "sides": [
            {"players": [{"playerId": "p1"}], "score": 2},
            {"players": [{"playerId": "p3", "age": 27, "gender": "female"}], "score": 1}
        ],
        "winningSide": 0
    });
    let (status, _) = post_json(&test.app, "/v1/matches/score", second_match).await;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_reversal_of_unknown_source_is_not_found() -> Result<()> {
    let test = setup_test_app().await;

    let (status, _) = post_json(
        &test.app,
        "/v1/reversals",
        json!({"sourceId": "missing", "playerId": "p1"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

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

fn singles_request(
    match_id: &str,
    tier: &str,
    winner: (&str, u32, &str),
    loser: (&str, u32, &str),
) -> Value {
    json!({
        "matchId": match_id,
        "tier": tier,
        "format": "singles",
        "pool": "adult",
        "sides": [
            {
                "players": [{"playerId": winner.0, "age": winner.1, "gender": winner.2}],
                "score": 2
            },
            {
                "players": [{"playerId": loser.0, "age": loser.1, "gender": loser.2}],
                "score": 1
            }
        ],
        "winningSide": 0
    })
}

fn tx_for<'a>(body: &'a Value, player: &str) -> &'a Value {
    body["transactions"]
        .as_array()
        .expect("transactions array")
        .iter()
        .find(|t| t["playerId"] == player)
        .expect("player transaction")
}

#[tokio::test]
async fn test_club_open_win_scores_three_and_four_fifty() -> Result<()> {
    let test = setup_test_app().await;

    let (status, body) = post_json(
        &test.app,
        "/v1/matches/score",
        singles_request("m-1", "club", ("p1", 28, "male"), ("p2", 30, "male")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let winner = tx_for(&body, "p1");
    assert_eq!(winner["basePoints"], "3");
    assert_eq!(winner["rankingDelta"], "3");
    assert_eq!(winner["rewardDelta"], "4.5");
    assert_eq!(winner["alreadyApplied"], false);

    let loser = tx_for(&body, "p2");
    assert_eq!(loser["rankingDelta"], "1");
    assert_eq!(loser["rewardDelta"], "1.5");

    let (status, ledger) = get(&test.app, "/v1/ledgers/p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger["rankingPoints"], "3");
    assert_eq!(ledger["rewardPoints"], "4.5");
    Ok(())
}

#[tokio::test]
async fn test_international_loss_in_fifty_plus_division() -> Result<()> {
    let test = setup_test_app().await;

    // p1 (55, in the 50+ division) loses to p2 (28, open): divisions are
    // mixed, so p1 keeps the 1.3 coefficient. 1 x 4.0 x 1.3 = 5.2.
    let (status, body) = post_json(
        &test.app,
        "/v1/matches/score",
        singles_request(
            "m-2",
            "international",
            ("p2", 28, "male"),
            ("p1", 55, "male"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let loser = tx_for(&body, "p1");
    assert_eq!(loser["rankingDelta"], "5.2");
    assert_eq!(loser["rewardDelta"], "7.8");

    let multipliers = loser["multipliers"].as_array().unwrap();
    assert_eq!(multipliers.len(), 3);
    assert_eq!(multipliers[0]["name"], "tournament_tier");
    assert_eq!(multipliers[0]["value"], "4");
    assert_eq!(multipliers[1]["name"], "age_division");
    assert_eq!(multipliers[1]["value"], "1.3");
    assert_eq!(multipliers[2]["name"], "gender_bonus");
    assert_eq!(multipliers[2]["value"], "1");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_submission_is_a_safe_replay() -> Result<()> {
    let test = setup_test_app().await;
    let request = singles_request("m-3", "club", ("p1", 28, "male"), ("p2", 30, "male"));

    let (status, first) = post_json(&test.app, "/v1/matches/score", request.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = post_json(&test.app, "/v1/matches/score", request).await;
    assert_eq!(status, StatusCode::OK);
    for tx in second["transactions"].as_array().unwrap() {
        assert_eq!(tx["alreadyApplied"], true);
    }
    assert_eq!(
        tx_for(&first, "p1")["idempotencyKey"],
        tx_for(&second, "p1")["idempotencyKey"]
    );

    // Ledger unchanged from its post-first-application state.
    let (_, ledger) = get(&test.app, "/v1/ledgers/p1").await;
    assert_eq!(ledger["rankingPoints"], "3");

    let (_, history) = get(&test.app, "/v1/ledgers/p1/transactions").await;
    assert_eq!(history["transactionCount"], 1);
    Ok(())
}

#[tokio::test]
async fn test_below_threshold_female_gets_individual_bonus() -> Result<()> {
    let test = setup_test_app().await;

    let (status, body) = post_json(
        &test.app,
        "/v1/matches/score",
        singles_request("m-4", "club", ("f1", 28, "female"), ("m1", 30, "male")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 3 x 1.0 x 1.0 x 1.15 = 3.45
    let female = tx_for(&body, "f1");
    assert_eq!(female["rankingDelta"], "3.45");
    assert_eq!(female["rewardDelta"], "5.18");

    let male = tx_for(&body, "m1");
    assert_eq!(male["rankingDelta"], "1");
    Ok(())
}

#[tokio::test]
async fn test_missing_profile_fields_are_rejected() -> Result<()> {
    let test = setup_test_app().await;

    let request = json!({
        "matchId": "m-5",
        "tier": "club",
        "format": "singles",
        "pool": "adult",
        "sides": [
            {"players": [{"playerId": "p1", "age": 28}], "score": 2},
            {"players": [{"playerId": "p2", "age": 30, "gender": "male"}], "score": 1}
        ],
        "winningSide": 0
    });

    let (status, body) = post_json(&test.app, "/v1/matches/score", request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("p1"), "error should name p1: {}", message);
    assert!(message.contains("gender"));

    // Nothing was credited.
    let (status, _) = get(&test.app, "/v1/ledgers/p2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_structurally_invalid_match_is_rejected() -> Result<()> {
    let test = setup_test_app().await;

    let mut request = singles_request("m-6", "club", ("p1", 28, "male"), ("p2", 30, "male"));
    request["winningSide"] = json!(2);

    let (status, body) = post_json(&test.app, "/v1/matches/score", request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("winning_side"));
    Ok(())
}

#[tokio::test]
async fn test_pool_isolation_rejects_cross_pool_match() -> Result<()> {
    let test = setup_test_app().await;

    let (status, _) = post_json(
        &test.app,
        "/v1/matches/score",
        singles_request("m-7", "club", ("p1", 28, "male"), ("p2", 30, "male")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // p1 now lives in the adult pool; a youth match must not touch it.
    let mut youth = singles_request("m-8", "club", ("p1", 14, "male"), ("y2", 14, "male"));
    youth["pool"] = json!("youth");

    let (status, body) = post_json(&test.app, "/v1/matches/score", youth).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("pool"));
    Ok(())
}

#[tokio::test]
async fn test_unknown_ledger_returns_not_found() -> Result<()> {
    let test = setup_test_app().await;
    let (status, _) = get(&test.app, "/v1/ledgers/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_health_endpoints() -> Result<()> {
    let test = setup_test_app().await;
    let (status, body) = get(&test.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

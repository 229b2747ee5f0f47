//! HTTP API tests, driving the router in-process

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use parimutuel_pool_ledger::{build_router, AppState, EngineConfig, ServerConfig};

const START: i64 = 1_700_000_000;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn test_config() -> ServerConfig {
    ServerConfig {
        state_file: None,
        faucet_enabled: true,
        faucet_amount: 5_000_000,
        engine: EngineConfig {
            min_duration_secs: 1,
            ..EngineConfig::default()
        },
        ..ServerConfig::default()
    }
}

fn test_app(config: ServerConfig) -> Router {
    test_app_with_clock(config).0
}

/// Router plus a handle on the time every handler reads
fn test_app_with_clock(config: ServerConfig) -> (Router, Arc<AtomicI64>) {
    let clock = Arc::new(AtomicI64::new(START));
    let handle = clock.clone();
    let state = AppState::with_clock(config, Arc::new(move || handle.load(Ordering::SeqCst)))
        .unwrap()
        .into_shared();
    (build_router(state), clock)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn create_market(app: &Router, market_id: u64, duration_seconds: i64, fee_bps: u16) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/markets",
        Some(json!({
            "creator": "creator",
            "resolver": "oracle",
            "market_id": market_id,
            "question": "Will the council approve the budget?",
            "duration_seconds": duration_seconds,
            "fee_bps": fee_bps,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["market_id"].as_str().unwrap().to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = test_app(test_config());
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["collateral_asset"], "USDC");
    assert_eq!(body["timestamp"], START);
}

#[tokio::test]
async fn test_market_lifecycle_over_http() {
    let (app, clock) = test_app_with_clock(test_config());

    for owner in ["alice", "bob"] {
        let (status, body) = send(&app, "POST", "/faucet", Some(json!({ "owner": owner }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], 5_000_000);
    }

    let market = create_market(&app, 1, 600, 100).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/markets/{}/buy", market),
        Some(json!({ "owner": "alice", "amount": 1_000_000, "side": "for" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["receipt"]["minted"], 990_000);
    assert_eq!(body["receipt"]["fees"]["fee"], 10_000);
    assert_eq!(body["collateral_balance"], 4_000_000);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/markets/{}/buy", market),
        Some(json!({ "owner": "bob", "amount": 1_000_000, "side": "against" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, odds) = send(&app, "GET", &format!("/markets/{}/odds", market), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(odds["for_supply"], 990_000);
    assert_eq!(odds["against_supply"], 990_000);
    assert_eq!(odds["total_pool"], 1_980_000);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/markets/{}/resolve", market),
        Some(json!({ "resolver": "alice", "outcome": "for" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "authorization");

    clock.fetch_add(600, Ordering::SeqCst);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/markets/{}/buy", market),
        Some(json!({ "owner": "bob", "amount": 1_000, "side": "for" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "state");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/markets/{}/resolve", market),
        Some(json!({ "resolver": "oracle", "outcome": "for" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["receipt"]["vault_balance"], 1_980_000);

    let (status, position) = send(
        &app,
        "GET",
        &format!("/markets/{}/positions/alice", market),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(position["claimable"], 1_980_000);

    let claim = json!({ "claimant": "alice" });
    let (status, body) = send(
        &app,
        "POST",
        &format!("/markets/{}/claim", market),
        Some(claim.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["receipt"]["payout"], 1_980_000);
    assert_eq!(body["collateral_balance"], 5_980_000);

    let (status, body) = send(&app, "POST", &format!("/markets/{}/claim", market), Some(claim)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, body) = send(&app, "GET", "/balance/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 5_980_000);
    assert!(body["transactions"].as_array().unwrap().len() >= 3);

    let (_, body) = send(&app, "GET", "/ledger", None).await;
    let activity = body["activity"].as_array().unwrap();
    assert!(activity.iter().any(|e| e.as_str().unwrap().contains("CLAIM")));
}

#[tokio::test]
async fn test_resolve_before_close_conflicts() {
    let app = test_app(test_config());
    let market = create_market(&app, 2, 3_600, 0).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/markets/{}/resolve", market),
        Some(json!({ "resolver": "oracle", "outcome": "against" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_error_status_mapping() {
    let app = test_app(test_config());

    let (status, body) = send(&app, "GET", "/markets/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "validation");

    let (status, body) = send(
        &app,
        "POST",
        "/markets",
        Some(json!({
            "creator": "creator",
            "market_id": 3,
            "question": "Will the fee cap hold?",
            "duration_seconds": 3_600,
            "fee_bps": 501,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("501"));

    let market = create_market(&app, 4, 3_600, 0).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/markets/{}/buy", market),
        Some(json!({ "owner": "nobody", "amount": 10, "side": "for" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/markets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["markets"][0]["status"]["state"], "active");
}

#[tokio::test]
async fn test_faucet_can_be_disabled() {
    let config = ServerConfig {
        faucet_enabled: false,
        ..test_config()
    };
    let app = test_app(config);

    let (status, _) = send(&app, "POST", "/faucet", Some(json!({ "owner": "alice" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = send(&app, "GET", "/balance/alice", None).await;
    assert_eq!(body["balance"], 0);
}

#[tokio::test]
async fn test_portfolio_lists_only_held_markets() {
    let app = test_app(test_config());
    send(&app, "POST", "/faucet", Some(json!({ "owner": "carol", "amount": 1_000 }))).await;

    let first = create_market(&app, 10, 3_600, 0).await;
    create_market(&app, 11, 3_600, 0).await;

    send(
        &app,
        "POST",
        &format!("/markets/{}/buy", first),
        Some(json!({ "owner": "carol", "amount": 400, "side": "against" })),
    )
    .await;

    let (status, body) = send(&app, "GET", "/positions/carol", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["positions"][0]["market"], first.as_str());
    assert_eq!(body["positions"][0]["against_balance"], 400);
}

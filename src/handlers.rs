// HTTP request handlers for the pari-mutuel pool API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::app_state::{lock, SharedState};
use crate::errors::{EngineError, ErrorKind};
use crate::models::*;

pub type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// Map an engine rejection onto a status code and an error body
pub fn engine_error(err: EngineError) -> (StatusCode, Json<Value>) {
    let status = match (&err, err.kind()) {
        (EngineError::MarketNotFound(_), _) => StatusCode::NOT_FOUND,
        (_, ErrorKind::Validation) => StatusCode::BAD_REQUEST,
        (_, ErrorKind::State) => StatusCode::CONFLICT,
        (_, ErrorKind::Authorization) => StatusCode::FORBIDDEN,
        (_, ErrorKind::Arithmetic) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    warn!(status = status.as_u16(), kind = ?err.kind(), "rejected: {}", err);
    (
        status,
        Json(json!({
            "success": false,
            "kind": err.kind(),
            "error": err.to_string(),
        })),
    )
}

// ===== HEALTH =====

pub async fn health_check(State(state): State<SharedState>) -> Json<Value> {
    let app_state = lock(&state);
    Json(json!({
        "status": "ok",
        "service": "parimutuel-pool-ledger",
        "collateral_asset": app_state.engine.config().collateral_asset,
        "markets": app_state.engine.markets().len(),
        "timestamp": app_state.now(),
    }))
}

// ===== MARKET ENDPOINTS =====

pub async fn get_markets(State(state): State<SharedState>) -> Json<Value> {
    let app_state = lock(&state);
    let markets: Vec<MarketSummary> = app_state
        .engine
        .markets()
        .into_iter()
        .map(MarketSummary::from)
        .collect();

    Json(json!({ "count": markets.len(), "markets": markets }))
}

pub async fn get_market(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let app_state = lock(&state);
    let book = app_state.engine.market(&id).map_err(engine_error)?;
    Ok(Json(json!(MarketSummary::from(book))))
}

pub async fn create_market(
    State(state): State<SharedState>,
    Json(payload): Json<CreateMarketRequest>,
) -> ApiResult {
    let mut app_state = lock(&state);
    let now = app_state.now();
    let params = payload.into_params();
    let question = params.question.clone();

    let key = app_state
        .engine
        .create_market(params, now)
        .map_err(engine_error)?;
    let market = app_state.engine.market(&key).map_err(engine_error)?.market.clone();

    app_state.log_activity("📊", "MARKET_CREATED", &format!("{} | {}", key, question));

    Ok(Json(json!({
        "success": true,
        "market_id": key,
        "market": market,
    })))
}

pub async fn get_odds(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let app_state = lock(&state);
    let odds = app_state.engine.odds(&id).map_err(engine_error)?;
    Ok(Json(json!(odds)))
}

// ===== TRADING ENDPOINTS =====

pub async fn buy(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<TradeRequest>,
) -> ApiResult {
    let mut app_state = lock(&state);
    let now = app_state.now();
    let receipt = app_state
        .engine
        .buy(&id, &request.owner, request.amount, request.side, now)
        .map_err(engine_error)?;
    let balance = app_state.engine.collateral_balance(&request.owner);

    app_state.log_activity(
        "🎯",
        "BUY",
        &format!(
            "{} bought {} {} on {} (fee {})",
            receipt.buyer, receipt.minted, receipt.side, receipt.market, receipt.fees.fee
        ),
    );

    Ok(Json(json!({
        "success": true,
        "receipt": receipt,
        "collateral_balance": balance,
    })))
}

pub async fn sell(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<TradeRequest>,
) -> ApiResult {
    let mut app_state = lock(&state);
    let now = app_state.now();
    let receipt = app_state
        .engine
        .sell(&id, &request.owner, request.amount, request.side, now)
        .map_err(engine_error)?;
    let balance = app_state.engine.collateral_balance(&request.owner);

    app_state.log_activity(
        "💱",
        "SELL",
        &format!(
            "{} sold {} {} on {}",
            receipt.seller, receipt.burned, receipt.side, receipt.market
        ),
    );

    Ok(Json(json!({
        "success": true,
        "receipt": receipt,
        "collateral_balance": balance,
    })))
}

// ===== SETTLEMENT ENDPOINTS =====

pub async fn resolve(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult {
    let mut app_state = lock(&state);
    let now = app_state.now();
    let receipt = app_state
        .engine
        .resolve(&id, &request.resolver, request.outcome, now)
        .map_err(engine_error)?;

    app_state.log_activity(
        "✅",
        "MARKET_RESOLVED",
        &format!(
            "{} resolved {} | pool {}",
            receipt.market, receipt.outcome, receipt.vault_balance
        ),
    );

    Ok(Json(json!({ "success": true, "receipt": receipt })))
}

pub async fn claim(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<ClaimRequest>,
) -> ApiResult {
    let mut app_state = lock(&state);
    let now = app_state.now();
    let receipt = app_state
        .engine
        .claim(&id, &request.claimant, now)
        .map_err(engine_error)?;
    let balance = app_state.engine.collateral_balance(&request.claimant);

    app_state.log_activity(
        "💰",
        "CLAIM",
        &format!("{} claimed {} from {}", receipt.claimant, receipt.payout, receipt.market),
    );

    Ok(Json(json!({
        "success": true,
        "receipt": receipt,
        "collateral_balance": balance,
    })))
}

pub async fn refund(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<ClaimRequest>,
) -> ApiResult {
    let mut app_state = lock(&state);
    let now = app_state.now();
    let receipt = app_state
        .engine
        .refund(&id, &request.claimant, now)
        .map_err(engine_error)?;
    let balance = app_state.engine.collateral_balance(&request.claimant);

    app_state.log_activity(
        "↩️",
        "REFUND",
        &format!("{} refunded {} from {}", receipt.claimant, receipt.payout, receipt.market),
    );

    Ok(Json(json!({
        "success": true,
        "receipt": receipt,
        "collateral_balance": balance,
    })))
}

// ===== POSITION ENDPOINTS =====

pub async fn get_position(
    State(state): State<SharedState>,
    Path((id, owner)): Path<(String, String)>,
) -> ApiResult {
    let app_state = lock(&state);
    let position = app_state.engine.position(&id, &owner).map_err(engine_error)?;
    Ok(Json(json!(position)))
}

pub async fn get_positions(
    State(state): State<SharedState>,
    Path(owner): Path<String>,
) -> Json<Value> {
    let app_state = lock(&state);
    let positions = app_state.engine.positions_for(&owner);
    Json(json!({
        "owner": owner,
        "count": positions.len(),
        "positions": positions,
    }))
}

// ===== LEDGER ENDPOINTS =====

pub async fn get_balance(
    State(state): State<SharedState>,
    Path(owner): Path<String>,
) -> Json<Value> {
    let app_state = lock(&state);
    let ledger = app_state.engine.ledger();
    Json(json!({
        "owner": owner,
        "asset": ledger.asset,
        "balance": ledger.balance(&owner),
        "transactions": ledger.get_transactions(&owner, 50),
    }))
}

pub async fn faucet(
    State(state): State<SharedState>,
    Json(request): Json<FaucetRequest>,
) -> ApiResult {
    let mut app_state = lock(&state);
    let now = app_state.now();
    if !app_state.config.faucet_enabled {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "error": "Faucet is disabled" })),
        ));
    }

    let amount = request.amount.unwrap_or(app_state.config.faucet_amount);
    let balance = app_state
        .engine
        .deposit_collateral(&request.owner, amount, now)
        .map_err(engine_error)?;

    app_state.log_activity(
        "🚰",
        "FAUCET",
        &format!("{} received {} units", request.owner, amount),
    );

    Ok(Json(json!({
        "success": true,
        "owner": request.owner,
        "amount": amount,
        "balance": balance,
    })))
}

pub async fn get_ledger_activity(State(state): State<SharedState>) -> Json<Value> {
    let app_state = lock(&state);
    Json(json!({
        "activity": app_state.activity,
        "stats": app_state.engine.ledger().stats(),
        "recent_transactions": app_state.engine.ledger().recent_transactions(50),
    }))
}

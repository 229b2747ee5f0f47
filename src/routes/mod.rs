// Routes module - assembles every HTTP endpoint into one router

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::handlers::*;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ===== HEALTH CHECK =====
        .route("/", get(health_check))
        .route("/health", get(health_check))
        // ===== MARKET ENDPOINTS =====
        .route("/markets", get(get_markets).post(create_market))
        .route("/markets/:id", get(get_market))
        .route("/markets/:id/odds", get(get_odds))
        // ===== TRADING ENDPOINTS =====
        .route("/markets/:id/buy", post(buy))
        .route("/markets/:id/sell", post(sell))
        // ===== SETTLEMENT ENDPOINTS =====
        .route("/markets/:id/resolve", post(resolve))
        .route("/markets/:id/claim", post(claim))
        .route("/markets/:id/refund", post(refund))
        // ===== POSITION ENDPOINTS =====
        .route("/markets/:id/positions/:owner", get(get_position))
        .route("/positions/:owner", get(get_positions))
        // ===== LEDGER ENDPOINTS =====
        .route("/balance/:owner", get(get_balance))
        .route("/faucet", post(faucet))
        .route("/ledger", get(get_ledger_activity))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

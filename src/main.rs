// Pari-Mutuel Pool Ledger - Main Entry Point

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use parimutuel_pool_ledger::app_state::{save_shared, AppState};
use parimutuel_pool_ledger::{build_router, ServerConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let addr = config.bind_addr;
    info!(
        %addr,
        asset = %config.engine.collateral_asset,
        faucet = config.faucet_enabled,
        state_file = ?config.state_file,
        "starting pari-mutuel pool ledger"
    );

    let state = match AppState::shared(config) {
        Ok(state) => state,
        Err(e) => {
            error!("failed to load persisted state: {}", e);
            std::process::exit(1);
        }
    };
    let shutdown_state = state.clone();
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, "failed to bind: {}", e);
            std::process::exit(1);
        }
    };
    info!("listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {}", e);
    }

    info!("shutdown signal received, saving state");
    if let Err(e) = save_shared(&shutdown_state) {
        error!("failed to save state: {}", e);
    };
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

//! Pari-mutuel binary pool ledger
//! Exports the settlement engine and the HTTP service for use as a library crate

pub mod addressing;
pub mod app_state;
pub mod config;
pub mod engine;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod market_resolve;
pub mod models;
pub mod routes;
pub mod shares;

pub use addressing::{derive_account, market_address, AccountRole};
pub use app_state::{AppState, Clock, SharedState};
pub use config::{EngineConfig, ServerConfig};
pub use engine::SettlementEngine;
pub use errors::{EngineError, ErrorKind};
pub use ledger::{CollateralLedger, LedgerStats, Transaction, TxType};
pub use market_resolve::{
    pro_rata_payout, ClaimReceipt, CreateMarketParams, FeeSink, Market, MarketBook,
    MarketOdds, MarketStatus, Resolution, ResolveReceipt, SettlementKind, Vault,
};
pub use routes::build_router;
pub use shares::{compute_fee, BuyReceipt, FeeSplit, Position, SellReceipt, Side, SideIssuer};

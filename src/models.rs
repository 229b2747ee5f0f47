// Request bodies for the pari-mutuel pool API

use serde::{Deserialize, Serialize};

use crate::market_resolve::{CreateMarketParams, Market, MarketBook, MarketOdds};
use crate::shares::Side;

/// `POST /markets`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMarketRequest {
    pub creator: String,
    /// Defaults to the creator
    #[serde(default)]
    pub resolver: Option<String>,
    pub market_id: u64,
    pub question: String,
    pub duration_seconds: i64,
    #[serde(default)]
    pub fee_bps: u16,
}

impl CreateMarketRequest {
    pub fn into_params(self) -> CreateMarketParams {
        CreateMarketParams {
            resolver: self.resolver.unwrap_or_else(|| self.creator.clone()),
            creator: self.creator,
            market_id: self.market_id,
            question: self.question,
            duration_seconds: self.duration_seconds,
            fee_bps: self.fee_bps,
        }
    }
}

/// `POST /markets/:id/buy` and `POST /markets/:id/sell`
#[derive(Debug, Clone, Deserialize)]
pub struct TradeRequest {
    pub owner: String,
    /// Gross collateral for a buy, side tokens for a sell
    pub amount: u64,
    pub side: Side,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub resolver: String,
    pub outcome: Side,
}

/// `POST /markets/:id/claim` and `POST /markets/:id/refund`
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimRequest {
    pub claimant: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaucetRequest {
    pub owner: String,
    /// Defaults to the configured faucet amount
    #[serde(default)]
    pub amount: Option<u64>,
}

/// Market listing entry: the market record plus its pool state
#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    #[serde(flatten)]
    pub market: Market,
    pub vault_balance: u64,
    pub creator_fees: u64,
    pub protocol_fees: u64,
    pub for_holders: usize,
    pub against_holders: usize,
    pub odds: MarketOdds,
}

impl From<&MarketBook> for MarketSummary {
    fn from(book: &MarketBook) -> Self {
        Self {
            market: book.market.clone(),
            vault_balance: book.vault.balance,
            creator_fees: book.creator_fee_sink.balance,
            protocol_fees: book.protocol_fee_sink.balance,
            for_holders: book.for_issuer.holders(),
            against_holders: book.against_issuer.holders(),
            odds: MarketOdds::for_book(book),
        }
    }
}

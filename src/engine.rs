// ============================================================================
// Settlement Engine - Pari-Mutuel Pool Ledger
// ============================================================================
//
// Owns every market book and the collateral ledger. Operations take the
// current unix time explicitly so the engine stays deterministic; the service
// layer passes the wall clock.
//
// Markets are independent aggregates addressed by their derived key. An
// operation borrows exactly one book plus the ledger, so `&mut self` is the
// serialization point: holding it means nothing else can interleave.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::addressing::market_address;
use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::ledger::CollateralLedger;
use crate::market_resolve::{
    claimable, execute_claim, execute_refund, ClaimReceipt, CreateMarketParams, MarketBook,
    MarketOdds, MarketStatus, ResolveReceipt,
};
use crate::shares::{execute_buy, execute_sell, BuyReceipt, Position, SellReceipt, Side};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementEngine {
    #[serde(skip)]
    config: EngineConfig,
    markets: HashMap<String, MarketBook>,
    ledger: CollateralLedger,
}

impl Default for SettlementEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SettlementEngine {
    pub fn new(config: EngineConfig) -> Self {
        let ledger = CollateralLedger::new(&config.collateral_asset);
        Self {
            config,
            markets: HashMap::new(),
            ledger,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Config is not persisted with the state; reapply it after loading
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Create a market and return its key
    pub fn create_market(
        &mut self,
        params: CreateMarketParams,
        now: i64,
    ) -> Result<String, EngineError> {
        let key = market_address(&params.creator, params.market_id);
        if self.markets.contains_key(&key) {
            return Err(EngineError::MarketAlreadyExists(key));
        }

        let book = MarketBook::open(key.clone(), params, &self.config, now)?;
        info!(
            market = %key,
            creator = %book.market.creator,
            resolver = %book.market.resolver,
            fee_bps = book.market.fee_bps,
            close_time = book.market.close_time,
            "market created"
        );
        self.markets.insert(key.clone(), book);
        Ok(key)
    }

    pub fn buy(
        &mut self,
        handle: &str,
        buyer: &str,
        gross_amount: u64,
        side: Side,
        now: i64,
    ) -> Result<BuyReceipt, EngineError> {
        let book = Self::book_mut(&mut self.markets, handle)?;
        execute_buy(book, &mut self.ledger, buyer, gross_amount, side, now)
    }

    pub fn sell(
        &mut self,
        handle: &str,
        seller: &str,
        token_amount: u64,
        side: Side,
        now: i64,
    ) -> Result<SellReceipt, EngineError> {
        let book = Self::book_mut(&mut self.markets, handle)?;
        execute_sell(book, &mut self.ledger, seller, token_amount, side, now)
    }

    pub fn resolve(
        &mut self,
        handle: &str,
        resolver: &str,
        outcome: Side,
        now: i64,
    ) -> Result<ResolveReceipt, EngineError> {
        Self::book_mut(&mut self.markets, handle)?.resolve(resolver, outcome, now)
    }

    pub fn claim(
        &mut self,
        handle: &str,
        claimant: &str,
        now: i64,
    ) -> Result<ClaimReceipt, EngineError> {
        let book = Self::book_mut(&mut self.markets, handle)?;
        execute_claim(book, &mut self.ledger, claimant, now)
    }

    pub fn refund(
        &mut self,
        handle: &str,
        holder: &str,
        now: i64,
    ) -> Result<ClaimReceipt, EngineError> {
        let book = Self::book_mut(&mut self.markets, handle)?;
        execute_refund(book, &mut self.ledger, holder, now)
    }

    /// Credit collateral from outside the pool. Returns the new balance.
    pub fn deposit_collateral(
        &mut self,
        owner: &str,
        amount: u64,
        now: i64,
    ) -> Result<u64, EngineError> {
        let balance = self.ledger.deposit(owner, amount, now)?;
        info!(owner, amount, balance, "collateral deposited");
        Ok(balance)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn collateral_balance(&self, owner: &str) -> u64 {
        self.ledger.balance(owner)
    }

    pub fn ledger(&self) -> &CollateralLedger {
        &self.ledger
    }

    pub fn market(&self, handle: &str) -> Result<&MarketBook, EngineError> {
        self.markets
            .get(handle)
            .ok_or_else(|| EngineError::MarketNotFound(handle.to_string()))
    }

    /// All markets, oldest first
    pub fn markets(&self) -> Vec<&MarketBook> {
        let mut books: Vec<&MarketBook> = self.markets.values().collect();
        books.sort_by(|a, b| {
            a.market
                .created_at
                .cmp(&b.market.created_at)
                .then_with(|| a.market.key.cmp(&b.market.key))
        });
        books
    }

    pub fn odds(&self, handle: &str) -> Result<MarketOdds, EngineError> {
        Ok(MarketOdds::for_book(self.market(handle)?))
    }

    pub fn position(&self, handle: &str, owner: &str) -> Result<Position, EngineError> {
        Ok(position_in(self.market(handle)?, owner))
    }

    /// Every market where `owner` holds side tokens
    pub fn positions_for(&self, owner: &str) -> Vec<Position> {
        self.markets()
            .into_iter()
            .map(|book| position_in(book, owner))
            .filter(|position| !position.is_empty())
            .collect()
    }

    /// Check the conservation invariants across every market and the ledger
    pub fn verify_conservation(&self) -> Result<(), EngineError> {
        let mut held: u128 = self.ledger.stats().total_collateral;

        for book in self.markets.values() {
            let key = &book.market.key;
            if book.vault.expected_balance() != book.vault.balance as i128 {
                return Err(EngineError::ConservationViolation(format!(
                    "market {} vault {} does not match its movements ({})",
                    key,
                    book.vault.balance,
                    book.vault.expected_balance()
                )));
            }
            for issuer in [&book.for_issuer, &book.against_issuer] {
                if issuer.sum_of_balances() != issuer.total_supply() as u128 {
                    return Err(EngineError::ConservationViolation(format!(
                        "market {} {} supply {} differs from its balance records",
                        key,
                        issuer.side,
                        issuer.total_supply()
                    )));
                }
            }
            if let MarketStatus::Resolved(resolution) = &book.market.status {
                let settled = book.vault.total_paid_out as u128 + book.vault.total_refunded as u128;
                if settled > resolution.vault_at_resolution as u128 {
                    return Err(EngineError::ConservationViolation(format!(
                        "market {} settled {} from a vault of {}",
                        key, settled, resolution.vault_at_resolution
                    )));
                }
            }
            held += book.vault.balance as u128
                + book.creator_fee_sink.balance as u128
                + book.protocol_fee_sink.balance as u128;
        }

        let deposited = self.ledger.total_deposited();
        if held != deposited {
            return Err(EngineError::ConservationViolation(format!(
                "{} units held against {} deposited",
                held, deposited
            )));
        }
        Ok(())
    }

    fn book_mut<'a>(
        markets: &'a mut HashMap<String, MarketBook>,
        handle: &str,
    ) -> Result<&'a mut MarketBook, EngineError> {
        markets
            .get_mut(handle)
            .ok_or_else(|| EngineError::MarketNotFound(handle.to_string()))
    }
}

fn position_in(book: &MarketBook, owner: &str) -> Position {
    Position {
        market: book.market.key.clone(),
        owner: owner.to_string(),
        for_balance: book.for_issuer.balance_of(owner),
        against_balance: book.against_issuer.balance_of(owner),
        claimable: claimable(book, owner),
    }
}

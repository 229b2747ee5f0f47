use serde::{Deserialize, Serialize};
use tracing::info;

use crate::addressing::{derive_account, AccountRole};
use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::market_resolve::escrow::{FeeSink, Vault};
use crate::shares::{Side, SideIssuer};

// Binary pari-mutuel market: one per (creator, market id) pair.
// Everything except `status` is fixed at creation.

/// Maximum fee in basis points (5%)
pub const MAX_FEE_BPS: u16 = 500;

/// Basis point denominator
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Question length bounds (bytes / trimmed characters)
pub const MAX_QUESTION_LEN: usize = 100;
pub const MIN_QUESTION_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Market {
    /// Market key derived from (creator, market_id)
    pub key: String,
    pub market_id: u64,
    pub creator: String,
    pub resolver: String,
    pub question: String,
    pub created_at: i64,
    /// Buys and sells are rejected at or after this time
    pub close_time: i64,
    pub fee_bps: u16,
    pub collateral_asset: String,
    pub accounts: MarketAccounts,
    pub status: MarketStatus,
}

/// Derived sub-account keys
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarketAccounts {
    pub vault: String,
    pub for_issuer: String,
    pub against_issuer: String,
    pub creator_fee_sink: String,
    pub protocol_fee_sink: String,
}

impl MarketAccounts {
    pub fn derive(market: &str) -> Self {
        Self {
            vault: derive_account(market, AccountRole::Vault),
            for_issuer: derive_account(market, AccountRole::ForIssuer),
            against_issuer: derive_account(market, AccountRole::AgainstIssuer),
            creator_fee_sink: derive_account(market, AccountRole::CreatorFeeSink),
            protocol_fee_sink: derive_account(market, AccountRole::ProtocolFeeSink),
        }
    }
}

/// Lifecycle state. The outcome only exists inside `Resolved`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MarketStatus {
    Active,
    Resolved(Resolution),
}

impl MarketStatus {
    pub fn outcome(&self) -> Option<Side> {
        match self {
            MarketStatus::Active => None,
            MarketStatus::Resolved(resolution) => Some(resolution.outcome),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MarketStatus::Active)
    }
}

/// Settlement snapshot taken when the resolver declares the outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Side,
    pub resolved_at: i64,
    pub vault_at_resolution: u64,
    pub winning_supply_at_resolution: u64,
}

/// Parameters of `create_market`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMarketParams {
    pub creator: String,
    pub resolver: String,
    pub market_id: u64,
    pub question: String,
    pub duration_seconds: i64,
    pub fee_bps: u16,
}

/// Result of a resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveReceipt {
    pub market: String,
    pub resolver: String,
    pub outcome: Side,
    pub resolved_at: i64,
    pub vault_balance: u64,
    pub winning_supply: u64,
    pub losing_supply: u64,
}

// ============================================================================
// MARKET BOOK
// ============================================================================

/// A market together with every record it owns: vault, issuers, fee sinks.
/// This is the unit every operation locks and mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketBook {
    pub market: Market,
    pub vault: Vault,
    pub for_issuer: SideIssuer,
    pub against_issuer: SideIssuer,
    pub creator_fee_sink: FeeSink,
    pub protocol_fee_sink: FeeSink,
}

impl MarketBook {
    /// Validate creation parameters and build a fresh, empty market
    pub fn open(
        key: String,
        params: CreateMarketParams,
        config: &EngineConfig,
        now: i64,
    ) -> Result<Self, EngineError> {
        if params.fee_bps > MAX_FEE_BPS {
            return Err(EngineError::InvalidFee(params.fee_bps));
        }

        let min_duration = config.min_duration_secs.max(1);
        if params.duration_seconds < min_duration {
            return Err(EngineError::InvalidDuration(format!(
                "{}s is below the minimum of {}s",
                params.duration_seconds, min_duration
            )));
        }
        if params.duration_seconds > config.max_duration_secs {
            return Err(EngineError::InvalidDuration(format!(
                "{}s exceeds the maximum of {}s",
                params.duration_seconds, config.max_duration_secs
            )));
        }
        let close_time = now
            .checked_add(params.duration_seconds)
            .ok_or_else(|| EngineError::InvalidDuration("close time overflows".into()))?;

        validate_question(&params.question)?;

        let accounts = MarketAccounts::derive(&key);
        let market = Market {
            key,
            market_id: params.market_id,
            creator: params.creator.clone(),
            resolver: params.resolver,
            question: params.question,
            created_at: now,
            close_time,
            fee_bps: params.fee_bps,
            collateral_asset: config.collateral_asset.clone(),
            accounts: accounts.clone(),
            status: MarketStatus::Active,
        };

        Ok(Self {
            market,
            vault: Vault::new(accounts.vault),
            for_issuer: SideIssuer::new(Side::For, accounts.for_issuer),
            against_issuer: SideIssuer::new(Side::Against, accounts.against_issuer),
            creator_fee_sink: FeeSink::new(accounts.creator_fee_sink, params.creator),
            protocol_fee_sink: FeeSink::new(
                accounts.protocol_fee_sink,
                config.protocol_fee_owner.clone(),
            ),
        })
    }

    pub fn key(&self) -> &str {
        &self.market.key
    }

    pub fn issuer(&self, side: Side) -> &SideIssuer {
        match side {
            Side::For => &self.for_issuer,
            Side::Against => &self.against_issuer,
        }
    }

    pub fn issuer_mut(&mut self, side: Side) -> &mut SideIssuer {
        match side {
            Side::For => &mut self.for_issuer,
            Side::Against => &mut self.against_issuer,
        }
    }

    /// Buys and sells require an active market before its close time
    pub fn ensure_tradable(&self, now: i64) -> Result<(), EngineError> {
        if !self.market.status.is_active() {
            return Err(EngineError::MarketNotActive(format!(
                "market {} is resolved",
                self.market.key
            )));
        }
        if now >= self.market.close_time {
            return Err(EngineError::MarketClosed(format!(
                "market {} closed at {}",
                self.market.key, self.market.close_time
            )));
        }
        Ok(())
    }

    /// Declare the outcome. One-shot and irreversible.
    pub fn resolve(
        &mut self,
        caller: &str,
        outcome: Side,
        now: i64,
    ) -> Result<ResolveReceipt, EngineError> {
        if caller != self.market.resolver {
            return Err(EngineError::Unauthorized(format!(
                "{} is not the resolver of market {}",
                caller, self.market.key
            )));
        }
        if !self.market.status.is_active() {
            return Err(EngineError::AlreadyResolved(self.market.key.clone()));
        }
        if now < self.market.close_time {
            return Err(EngineError::ResolutionTooEarly {
                close_time: self.market.close_time,
                now,
            });
        }

        let winning_supply = self.issuer(outcome).total_supply();
        let losing_supply = self.issuer(outcome.opposite()).total_supply();
        let resolution = Resolution {
            outcome,
            resolved_at: now,
            vault_at_resolution: self.vault.balance,
            winning_supply_at_resolution: winning_supply,
        };
        self.market.status = MarketStatus::Resolved(resolution);

        info!(
            market = %self.market.key,
            outcome = %outcome,
            vault = self.vault.balance,
            winning_supply,
            losing_supply,
            "market resolved"
        );

        Ok(ResolveReceipt {
            market: self.market.key.clone(),
            resolver: caller.to_string(),
            outcome,
            resolved_at: now,
            vault_balance: self.vault.balance,
            winning_supply,
            losing_supply,
        })
    }
}

fn validate_question(question: &str) -> Result<(), EngineError> {
    if question.len() > MAX_QUESTION_LEN {
        return Err(EngineError::InvalidQuestion(format!(
            "{} bytes exceeds the maximum of {}",
            question.len(),
            MAX_QUESTION_LEN
        )));
    }
    if question.trim().chars().count() < MIN_QUESTION_LEN {
        return Err(EngineError::InvalidQuestion(format!(
            "must be at least {} characters",
            MIN_QUESTION_LEN
        )));
    }
    Ok(())
}

//! Claim and refund settlement for resolved markets.
//!
//! A winning holder burns their entire winning-side balance `b` and receives
//! a pro-rata share of the **whole** vault, losers' stakes included:
//!
//! ```text
//! payout = floor(b * vault_balance / winning_supply)
//! ```
//!
//! Supply and vault are read together, before this claim's burn, so every
//! claim sees the same per-token value up to rounding. Floor division leaves
//! at most one unit of dust per claimant in the vault and can never overdraw it.
//!
//! When nobody held the winning side at resolution, claims are unreachable.
//! Losing-side holders may then take a refund, computed the same way over the
//! losing supply.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::ledger::{CollateralLedger, Transaction, TxType};
use crate::market_resolve::markets::{MarketBook, MarketStatus, Resolution};
use crate::shares::Side;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettlementKind {
    Claim,
    Refund,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub id: String,
    pub kind: SettlementKind,
    pub market: String,
    pub claimant: String,
    /// Side whose tokens were burned
    pub side: Side,
    pub burned: u64,
    pub payout: u64,
    /// Vault balance left after the payout
    pub vault_remaining: u64,
    pub timestamp: i64,
}

/// `floor(balance * vault / supply)` in 128-bit arithmetic
pub fn pro_rata_payout(balance: u64, vault: u64, supply: u64) -> Result<u64, EngineError> {
    if supply == 0 || balance > supply {
        return Err(EngineError::ConservationViolation(format!(
            "holder balance {} against side supply {}",
            balance, supply
        )));
    }
    let payout = (balance as u128)
        .checked_mul(vault as u128)
        .ok_or_else(|| EngineError::overflow("payout"))?
        / supply as u128;
    u64::try_from(payout).map_err(|_| EngineError::overflow("payout"))
}

fn resolution_of(book: &MarketBook) -> Result<Resolution, EngineError> {
    match &book.market.status {
        MarketStatus::Resolved(resolution) => Ok(resolution.clone()),
        MarketStatus::Active => Err(EngineError::MarketNotResolved(book.market.key.clone())),
    }
}

/// Pay a winning holder their share of the vault
pub fn execute_claim(
    book: &mut MarketBook,
    ledger: &mut CollateralLedger,
    claimant: &str,
    now: i64,
) -> Result<ClaimReceipt, EngineError> {
    let resolution = resolution_of(book)?;
    settle(book, ledger, claimant, resolution.outcome, &resolution, SettlementKind::Claim, now)
}

/// Return a losing holder's share of the vault when the winning side was empty
pub fn execute_refund(
    book: &mut MarketBook,
    ledger: &mut CollateralLedger,
    holder: &str,
    now: i64,
) -> Result<ClaimReceipt, EngineError> {
    let resolution = resolution_of(book)?;
    if resolution.winning_supply_at_resolution > 0 {
        return Err(EngineError::RefundUnavailable(format!(
            "{} side had holders at resolution; use claim",
            resolution.outcome
        )));
    }
    settle(
        book,
        ledger,
        holder,
        resolution.outcome.opposite(),
        &resolution,
        SettlementKind::Refund,
        now,
    )
}

/// What `owner` would receive from a claim or refund right now
pub fn claimable(book: &MarketBook, owner: &str) -> Option<u64> {
    let resolution = match &book.market.status {
        MarketStatus::Resolved(resolution) => resolution,
        MarketStatus::Active => return None,
    };
    let side = if resolution.winning_supply_at_resolution > 0 {
        resolution.outcome
    } else {
        resolution.outcome.opposite()
    };
    let issuer = book.issuer(side);
    let balance = issuer.balance_of(owner);
    if balance == 0 {
        return Some(0);
    }
    pro_rata_payout(balance, book.vault.balance, issuer.total_supply()).ok()
}

fn settle(
    book: &mut MarketBook,
    ledger: &mut CollateralLedger,
    owner: &str,
    side: Side,
    resolution: &Resolution,
    kind: SettlementKind,
    now: i64,
) -> Result<ClaimReceipt, EngineError> {
    let issuer = book.issuer(side);
    let balance = issuer.balance_of(owner);
    if balance == 0 {
        return Err(EngineError::NothingToClaim(format!(
            "{} holds no {} tokens in market {}",
            owner, side, book.market.key
        )));
    }

    let vault_balance = book.vault.balance;
    let payout = pro_rata_payout(balance, vault_balance, issuer.total_supply())?;
    if payout > vault_balance {
        return Err(EngineError::ConservationViolation(format!(
            "payout {} exceeds vault {}",
            payout, vault_balance
        )));
    }

    let (settled_before, settled_label) = match kind {
        SettlementKind::Claim => (book.vault.total_paid_out, "claim payouts"),
        SettlementKind::Refund => (book.vault.total_refunded, "refunds"),
    };
    let settled_after = settled_before
        .checked_add(payout)
        .ok_or_else(|| EngineError::overflow(settled_label))?;
    if settled_after > resolution.vault_at_resolution {
        return Err(EngineError::ConservationViolation(format!(
            "{} {} would exceed vault at resolution {}",
            settled_label, settled_after, resolution.vault_at_resolution
        )));
    }

    let (holder_after, supply_after) = issuer.burned(owner, balance)?;
    let vault_after = vault_balance - payout;

    // commit
    ledger.credit(owner, payout)?;
    book.vault.balance = vault_after;
    match kind {
        SettlementKind::Claim => book.vault.total_paid_out = settled_after,
        SettlementKind::Refund => book.vault.total_refunded = settled_after,
    }
    book.issuer_mut(side).commit(owner, holder_after, supply_after);

    let market_key = book.market.key.clone();
    let tx_type = match kind {
        SettlementKind::Claim => TxType::Claim,
        SettlementKind::Refund => TxType::Refund,
    };
    ledger.record(Transaction::payout(
        tx_type,
        &book.vault.address,
        owner,
        &market_key,
        side,
        payout,
        now,
    ));

    info!(
        market = %market_key,
        owner,
        side = %side,
        burned = balance,
        payout,
        vault_remaining = vault_after,
        "{:?} settled",
        kind
    );

    Ok(ClaimReceipt {
        id: format!("settle_{}", &Uuid::new_v4().simple().to_string()[..12]),
        kind,
        market: market_key,
        claimant: owner.to_string(),
        side,
        burned: balance,
        payout,
        vault_remaining: vault_after,
        timestamp: now,
    })
}

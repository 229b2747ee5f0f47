// ============================================================================
// Issuance (Buy) - Pari-Mutuel Pool Ledger
// ============================================================================
//
// Buying converts collateral into side tokens of the chosen outcome.
//
// Core Mechanic:
//   gross collateral → fee (floor(gross * fee_bps / 10_000))
//                    → net collateral into the vault
//                    → net side tokens minted to the buyer (always 1:1)
//
// Fee Split:
//   creator cut  = floor(fee / 2)
//   protocol cut = fee - creator cut (an odd unit goes to the protocol)
//
// Every amount is computed up front; the buyer debit is the only write that
// can fail and it happens first, so a rejected buy changes nothing.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::Side;
use crate::errors::EngineError;
use crate::ledger::{CollateralLedger, Transaction, TxType};
use crate::market_resolve::markets::{MarketBook, BPS_DENOMINATOR};

// ============================================================================
// FEE SPLIT
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeeSplit {
    pub gross: u64,
    pub fee: u64,
    pub creator_cut: u64,
    pub protocol_cut: u64,
    pub net: u64,
}

/// Split a gross buy amount into fee legs and the net vault deposit
pub fn compute_fee(gross: u64, fee_bps: u16) -> Result<FeeSplit, EngineError> {
    let fee = (gross as u128)
        .checked_mul(fee_bps as u128)
        .map(|v| v / BPS_DENOMINATOR as u128)
        .ok_or_else(|| EngineError::overflow("fee"))?;
    let fee = u64::try_from(fee).map_err(|_| EngineError::overflow("fee"))?;

    let creator_cut = fee / 2;
    let protocol_cut = fee - creator_cut;
    let net = gross
        .checked_sub(fee)
        .ok_or_else(|| EngineError::overflow("net amount"))?;

    Ok(FeeSplit {
        gross,
        fee,
        creator_cut,
        protocol_cut,
        net,
    })
}

// ============================================================================
// RECEIPT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyReceipt {
    pub id: String,
    pub market: String,
    pub buyer: String,
    pub side: Side,
    pub fees: FeeSplit,
    /// Side tokens minted (== fees.net)
    pub minted: u64,
    /// Buyer's side balance after the mint
    pub new_balance: u64,
    pub timestamp: i64,
}

// ============================================================================
// ISSUANCE
// ============================================================================

/// Execute a buy against a market
pub fn execute_buy(
    book: &mut MarketBook,
    ledger: &mut CollateralLedger,
    buyer: &str,
    gross: u64,
    side: Side,
    now: i64,
) -> Result<BuyReceipt, EngineError> {
    if gross == 0 {
        return Err(EngineError::InvalidAmount("buy amount must be positive".into()));
    }
    book.ensure_tradable(now)?;

    let split = compute_fee(gross, book.market.fee_bps)?;

    let available = ledger.balance(buyer);
    if available < gross {
        return Err(EngineError::InsufficientBalance {
            owner: buyer.to_string(),
            needed: gross,
            available,
        });
    }

    let vault_after = book
        .vault
        .balance
        .checked_add(split.net)
        .ok_or_else(|| EngineError::overflow("vault balance"))?;
    let deposited_after = book
        .vault
        .total_deposited
        .checked_add(split.net)
        .ok_or_else(|| EngineError::overflow("vault deposits"))?;
    let creator_after = book
        .creator_fee_sink
        .balance
        .checked_add(split.creator_cut)
        .ok_or_else(|| EngineError::overflow("creator fee sink"))?;
    let protocol_after = book
        .protocol_fee_sink
        .balance
        .checked_add(split.protocol_cut)
        .ok_or_else(|| EngineError::overflow("protocol fee sink"))?;
    let (holder_after, supply_after) = book.issuer(side).minted(buyer, split.net)?;

    // commit
    ledger.debit(buyer, gross)?;
    book.vault.balance = vault_after;
    book.vault.total_deposited = deposited_after;
    book.creator_fee_sink.balance = creator_after;
    book.protocol_fee_sink.balance = protocol_after;
    book.issuer_mut(side).commit(buyer, holder_after, supply_after);

    let market_key = book.market.key.clone();
    ledger.record(Transaction::buy(buyer, &book.vault.address, &market_key, side, split.net, now));
    if split.creator_cut > 0 {
        ledger.record(Transaction::fee(
            TxType::CreatorFee,
            buyer,
            &book.creator_fee_sink.address,
            &market_key,
            split.creator_cut,
            now,
        ));
    }
    if split.protocol_cut > 0 {
        ledger.record(Transaction::fee(
            TxType::ProtocolFee,
            buyer,
            &book.protocol_fee_sink.address,
            &market_key,
            split.protocol_cut,
            now,
        ));
    }

    info!(
        market = %market_key,
        buyer,
        side = %side,
        gross,
        fee = split.fee,
        minted = split.net,
        "side tokens issued"
    );

    Ok(BuyReceipt {
        id: format!("buy_{}", &Uuid::new_v4().simple().to_string()[..12]),
        market: market_key,
        buyer: buyer.to_string(),
        side,
        fees: split,
        minted: split.net,
        new_balance: holder_after,
        timestamp: now,
    })
}

// ============================================================================
// TESTS
// ============================================================================

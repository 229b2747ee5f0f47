// ============================================================================
// Redemption (Sell) - Pari-Mutuel Pool Ledger
// ============================================================================
//
// Selling reverses the net step of a buy while the market is open:
//
//   burn n side tokens → vault pays n collateral units back to the seller
//
// No fee is charged on redemption. Buy fees are not refunded either, so a
// buy followed by a full sell returns exactly the net amount that was minted.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::Side;
use crate::errors::EngineError;
use crate::ledger::{CollateralLedger, Transaction};
use crate::market_resolve::markets::MarketBook;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellReceipt {
    pub id: String,
    pub market: String,
    pub seller: String,
    pub side: Side,
    pub burned: u64,
    /// Collateral credited to the seller
    pub collateral_returned: u64,
    /// Seller's side balance after the burn
    pub new_balance: u64,
    pub timestamp: i64,
}

/// Execute a sell against a market
pub fn execute_sell(
    book: &mut MarketBook,
    ledger: &mut CollateralLedger,
    seller: &str,
    amount: u64,
    side: Side,
    now: i64,
) -> Result<SellReceipt, EngineError> {
    if amount == 0 {
        return Err(EngineError::InvalidAmount("sell amount must be positive".into()));
    }
    book.ensure_tradable(now)?;

    let (holder_after, supply_after) = book.issuer(side).burned(seller, amount)?;

    let vault_after = book.vault.balance.checked_sub(amount).ok_or_else(|| {
        EngineError::ConservationViolation(format!(
            "vault {} cannot cover redemption of {}",
            book.vault.balance, amount
        ))
    })?;
    let redeemed_after = book
        .vault
        .total_redeemed
        .checked_add(amount)
        .ok_or_else(|| EngineError::overflow("vault redemptions"))?;

    // commit
    ledger.credit(seller, amount)?;
    book.vault.balance = vault_after;
    book.vault.total_redeemed = redeemed_after;
    book.issuer_mut(side).commit(seller, holder_after, supply_after);

    let market_key = book.market.key.clone();
    ledger.record(Transaction::sell(&book.vault.address, seller, &market_key, side, amount, now));

    info!(market = %market_key, seller, side = %side, amount, "side tokens redeemed");

    Ok(SellReceipt {
        id: format!("sell_{}", &Uuid::new_v4().simple().to_string()[..12]),
        market: market_key,
        seller: seller.to_string(),
        side,
        burned: amount,
        collateral_returned: amount,
        new_balance: holder_after,
        timestamp: now,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::market_address;
    use crate::config::EngineConfig;
    use crate::market_resolve::markets::CreateMarketParams;
    use crate::shares::execute_buy;

    fn setup(fee_bps: u16) -> (MarketBook, CollateralLedger) {
        let params = CreateMarketParams {
            creator: "creator".into(),
            resolver: "resolver".into(),
            market_id: 9,
            question: "Will the launch happen on schedule?".into(),
            duration_seconds: 600,
            fee_bps,
        };
        let book = MarketBook::open(market_address("creator", 9), params, &EngineConfig::default(), 0).unwrap();
        let mut ledger = CollateralLedger::new("USDC");
        ledger.deposit("alice", 1_000_000, 0).unwrap();
        (book, ledger)
    }

    #[test]
    fn test_sell_is_fee_free_one_to_one() {
        let (mut book, mut ledger) = setup(500);
        execute_buy(&mut book, &mut ledger, "alice", 1_000_000, Side::Against, 1).unwrap();
        assert_eq!(ledger.balance("alice"), 0);

        let receipt = execute_sell(&mut book, &mut ledger, "alice", 400_000, Side::Against, 2).unwrap();
        assert_eq!(receipt.collateral_returned, 400_000);
        assert_eq!(receipt.new_balance, 550_000);
        assert_eq!(ledger.balance("alice"), 400_000);
        assert_eq!(book.vault.balance, 550_000);
        assert_eq!(book.against_issuer.total_supply(), 550_000);
        // fees stay where the buy put them
        assert_eq!(book.creator_fee_sink.balance, 25_000);
        assert_eq!(book.protocol_fee_sink.balance, 25_000);
    }

    #[test]
    fn test_full_round_trip_returns_net() {
        let (mut book, mut ledger) = setup(500);
        let buy = execute_buy(&mut book, &mut ledger, "alice", 1_000_000, Side::For, 1).unwrap();
        execute_sell(&mut book, &mut ledger, "alice", buy.minted, Side::For, 2).unwrap();

        assert_eq!(ledger.balance("alice"), 950_000);
        assert_eq!(book.vault.balance, 0);
        assert_eq!(book.vault.expected_balance(), 0);
        assert_eq!(book.for_issuer.total_supply(), 0);
    }

    #[test]
    fn test_sell_more_than_held() {
        let (mut book, mut ledger) = setup(0);
        execute_buy(&mut book, &mut ledger, "alice", 100, Side::For, 1).unwrap();

        let err = execute_sell(&mut book, &mut ledger, "alice", 101, Side::For, 2).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientShares { .. }));

        // holding the other side does not help
        let err = execute_sell(&mut book, &mut ledger, "alice", 1, Side::Against, 2).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientShares { .. }));
        assert_eq!(book.vault.balance, 100);
    }

    #[test]
    fn test_sell_after_close_rejected() {
        let (mut book, mut ledger) = setup(0);
        execute_buy(&mut book, &mut ledger, "alice", 100, Side::For, 1).unwrap();

        let err = execute_sell(&mut book, &mut ledger, "alice", 50, Side::For, 600).unwrap_err();
        assert!(matches!(err, EngineError::MarketClosed(_)));
        assert_eq!(book.for_issuer.balance_of("alice"), 100);
    }

    #[test]
    fn test_sell_after_resolution_rejected() {
        let (mut book, mut ledger) = setup(0);
        execute_buy(&mut book, &mut ledger, "alice", 100, Side::For, 1).unwrap();
        book.resolve("resolver", Side::For, 600).unwrap();

        let err = execute_sell(&mut book, &mut ledger, "alice", 50, Side::For, 601).unwrap_err();
        assert!(matches!(err, EngineError::MarketNotActive(_)));
    }
}

// ============================================================================
// Odds - informational pricing for a pari-mutuel market
// ============================================================================
//
// Price(side)      = side supply / (for supply + against supply)
// Multiplier(side) = 1 / price, rounded to 2 decimals, capped at 1000x
//
// Nothing here feeds back into issuance: a buy always mints 1:1 no matter
// what these numbers say. Equal prices when the pool is empty.
//
// ============================================================================

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::market_resolve::markets::MarketBook;

pub const MAX_MULTIPLIER: Decimal = dec!(1000);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarketOdds {
    pub market: String,
    pub for_supply: u64,
    pub against_supply: u64,
    /// Current vault balance
    pub total_pool: u64,
    pub for_price: Decimal,
    pub against_price: Decimal,
    pub for_multiplier: Decimal,
    pub against_multiplier: Decimal,
}

impl MarketOdds {
    pub fn for_book(book: &MarketBook) -> Self {
        let for_supply = book.for_issuer.total_supply();
        let against_supply = book.against_issuer.total_supply();
        let (for_price, against_price) = prices(for_supply, against_supply);

        Self {
            market: book.market.key.clone(),
            for_supply,
            against_supply,
            total_pool: book.vault.balance,
            for_price,
            against_price,
            for_multiplier: multiplier(for_price),
            against_multiplier: multiplier(against_price),
        }
    }
}

fn prices(for_supply: u64, against_supply: u64) -> (Decimal, Decimal) {
    let total = Decimal::from(for_supply) + Decimal::from(against_supply);
    if total.is_zero() {
        return (dec!(0.5), dec!(0.5));
    }
    let for_price = Decimal::from(for_supply) / total;
    (for_price, Decimal::ONE - for_price)
}

fn multiplier(price: Decimal) -> Decimal {
    if price.is_zero() {
        return MAX_MULTIPLIER;
    }
    (Decimal::ONE / price).round_dp(2).min(MAX_MULTIPLIER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_is_even() {
        let (f, a) = prices(0, 0);
        assert_eq!(f, dec!(0.5));
        assert_eq!(a, dec!(0.5));
        assert_eq!(multiplier(f), dec!(2));
    }

    #[test]
    fn test_prices_follow_supply() {
        let (f, a) = prices(75, 25);
        assert_eq!(f, dec!(0.75));
        assert_eq!(a, dec!(0.25));
        assert_eq!(multiplier(f), dec!(1.33));
        assert_eq!(multiplier(a), dec!(4));
    }

    #[test]
    fn test_multiplier_capped() {
        let (f, a) = prices(1, 1_000_000);
        assert!(f > Decimal::ZERO);
        assert_eq!(multiplier(f), MAX_MULTIPLIER);
        assert_eq!(multiplier(a), dec!(1));
        assert_eq!(multiplier(Decimal::ZERO), MAX_MULTIPLIER);
    }
}

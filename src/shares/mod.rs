// ============================================================================
// Shares Module - Pari-Mutuel Pool Ledger
// ============================================================================
//
// Side tokens represent a stake on one outcome of a binary market.
//
// Core Invariant:
//   1 unit of net collateral deposited = 1 side token minted
//
// There is no repricing: the supply ratio between FOR and AGAINST is only an
// informational "price". At resolution the winning side's holders split the
// entire vault pro-rata; the losing side's tokens become worthless.
//
// Each market owns two issuers. An issuer tracks its total supply and one
// balance record per owner; the supply always equals the sum of the records.
//
// ============================================================================

pub mod mint;
pub mod redeem;

pub use mint::*;
pub use redeem::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::EngineError;

// ============================================================================
// SIDE
// ============================================================================

/// Outcome side of a binary market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    For,
    Against,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::For => Side::Against,
            Side::Against => Side::For,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::For => "FOR",
            Side::Against => "AGAINST",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SIDE ISSUER
// ============================================================================

/// Fungible token issuer for one side of one market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideIssuer {
    pub side: Side,
    /// Derived account key of this issuer
    pub address: String,
    total_supply: u64,
    /// Balance records keyed by owner
    balances: BTreeMap<String, u64>,
}

impl SideIssuer {
    pub fn new(side: Side, address: String) -> Self {
        Self {
            side,
            address,
            total_supply: 0,
            balances: BTreeMap::new(),
        }
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn balance_of(&self, owner: &str) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Number of owners currently holding a non-zero balance
    pub fn holders(&self) -> usize {
        self.balances.values().filter(|b| **b > 0).count()
    }

    /// Balances after minting `amount` to `owner`: `(holder, supply)`
    pub fn minted(&self, owner: &str, amount: u64) -> Result<(u64, u64), EngineError> {
        let holder = self
            .balance_of(owner)
            .checked_add(amount)
            .ok_or_else(|| EngineError::overflow("side token balance"))?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| EngineError::overflow("side token supply"))?;
        Ok((holder, supply))
    }

    /// Balances after burning `amount` from `owner`: `(holder, supply)`
    pub fn burned(&self, owner: &str, amount: u64) -> Result<(u64, u64), EngineError> {
        let available = self.balance_of(owner);
        let holder = available
            .checked_sub(amount)
            .ok_or_else(|| EngineError::InsufficientShares {
                owner: owner.to_string(),
                needed: amount,
                available,
            })?;
        let supply = self.total_supply.checked_sub(amount).ok_or_else(|| {
            EngineError::ConservationViolation(format!(
                "{} supply {} below burn of {}",
                self.side, self.total_supply, amount
            ))
        })?;
        Ok((holder, supply))
    }

    /// Write balances computed by `minted`/`burned`. Infallible so that a
    /// commit never stops halfway.
    pub(crate) fn commit(&mut self, owner: &str, holder: u64, supply: u64) {
        self.balances.insert(owner.to_string(), holder);
        self.total_supply = supply;
    }

    /// Sum of all balance records
    pub fn sum_of_balances(&self) -> u128 {
        self.balances.values().map(|b| *b as u128).sum()
    }
}

// ============================================================================
// POSITION
// ============================================================================

/// A participant's holdings in one market
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub market: String,
    pub owner: String,
    pub for_balance: u64,
    pub against_balance: u64,
    /// Collateral a claim (or refund) would pay right now; `None` while the
    /// market is still active
    pub claimable: Option<u64>,
}

impl Position {
    pub fn is_empty(&self) -> bool {
        self.for_balance == 0 && self.against_balance == 0
    }

    pub fn balance(&self, side: Side) -> u64 {
        match side {
            Side::For => self.for_balance,
            Side::Against => self.against_balance,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

// Market escrow accounts: the pooled collateral vault and the two fee sinks

use serde::{Deserialize, Serialize};

/// Collateral pooled by a market. Only issuance, redemption, claims and
/// refunds move funds in or out.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vault {
    /// Derived account key
    pub address: String,
    /// Current balance in base units
    pub balance: u64,
    /// Net collateral ever deposited by buys
    pub total_deposited: u64,
    /// Collateral returned by sells
    pub total_redeemed: u64,
    /// Collateral paid out by claims
    pub total_paid_out: u64,
    /// Collateral returned by refunds
    pub total_refunded: u64,
}

impl Vault {
    pub fn new(address: String) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    /// `deposited - redeemed - paid_out - refunded`; must always equal `balance`
    pub fn expected_balance(&self) -> i128 {
        self.total_deposited as i128
            - self.total_redeemed as i128
            - self.total_paid_out as i128
            - self.total_refunded as i128
    }
}

/// Fee accrual account, credited only by buys
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeeSink {
    pub address: String,
    /// Party the fees accrue to
    pub owner: String,
    pub balance: u64,
}

impl FeeSink {
    pub fn new(address: String, owner: String) -> Self {
        Self {
            address,
            owner,
            balance: 0,
        }
    }
}

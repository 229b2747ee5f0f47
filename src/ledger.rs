/// Collateral Ledger for the pari-mutuel pool
///
/// Holds every participant's collateral balance (in the smallest unit of the
/// collateral asset, 6 decimals for USDC) and an append-only journal of every
/// movement the engine makes:
/// - Deposits (faucet / external funding)
/// - Buys and the two fee legs they pay
/// - Sells, claims and refunds paid out of market vaults
///
/// Debits never take a balance below zero and credits are overflow-checked,
/// so a failed call leaves the balance untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::shares::Side;

// ============================================================================
// TRANSACTIONS
// ============================================================================

/// Transaction types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TxType {
    Deposit,
    Buy,
    CreatorFee,
    ProtocolFee,
    Sell,
    Claim,
    Refund,
}

/// A single journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub tx_type: TxType,
    pub from: String,
    pub to: Option<String>,
    pub amount: u64,
    pub market_id: Option<String>,
    pub side: Option<Side>,
    pub timestamp: i64,
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub description: Option<String>,
}

impl Transaction {
    pub fn new(tx_type: TxType, from: &str, amount: u64, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tx_type,
            from: from.to_string(),
            to: None,
            amount,
            market_id: None,
            side: None,
            timestamp,
            block_number: 0,
            description: None,
        }
    }

    pub fn deposit(to: &str, amount: u64, timestamp: i64) -> Self {
        let mut tx = Self::new(TxType::Deposit, "FAUCET", amount, timestamp);
        tx.to = Some(to.to_string());
        tx.description = Some(format!("Deposit {} units", amount));
        tx
    }

    pub fn buy(buyer: &str, vault: &str, market_id: &str, side: Side, net: u64, timestamp: i64) -> Self {
        let mut tx = Self::new(TxType::Buy, buyer, net, timestamp);
        tx.to = Some(vault.to_string());
        tx.market_id = Some(market_id.to_string());
        tx.side = Some(side);
        tx.description = Some(format!("Bought {} {} tokens", net, side.as_str()));
        tx
    }

    pub fn fee(tx_type: TxType, payer: &str, sink: &str, market_id: &str, amount: u64, timestamp: i64) -> Self {
        let mut tx = Self::new(tx_type, payer, amount, timestamp);
        tx.to = Some(sink.to_string());
        tx.market_id = Some(market_id.to_string());
        tx.description = Some(format!("{:?} of {} units", tx_type, amount));
        tx
    }

    pub fn sell(vault: &str, seller: &str, market_id: &str, side: Side, amount: u64, timestamp: i64) -> Self {
        let mut tx = Self::new(TxType::Sell, vault, amount, timestamp);
        tx.to = Some(seller.to_string());
        tx.market_id = Some(market_id.to_string());
        tx.side = Some(side);
        tx.description = Some(format!("Sold {} {} tokens", amount, side.as_str()));
        tx
    }

    pub fn payout(tx_type: TxType, vault: &str, to: &str, market_id: &str, side: Side, amount: u64, timestamp: i64) -> Self {
        let mut tx = Self::new(tx_type, vault, amount, timestamp);
        tx.to = Some(to.to_string());
        tx.market_id = Some(market_id.to_string());
        tx.side = Some(side);
        tx.description = Some(format!("{:?} of {} units from resolved market", tx_type, amount));
        tx
    }

    /// Whether this entry moved funds into or out of `owner`'s wallet
    pub fn involves(&self, owner: &str) -> bool {
        self.from == owner || self.to.as_deref() == Some(owner)
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Per-owner collateral balances plus the movement journal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollateralLedger {
    /// Collateral asset symbol (e.g. USDC)
    pub asset: String,
    /// Owner -> balance in base units
    balances: HashMap<String, u64>,
    /// All journal entries
    transactions: Vec<Transaction>,
    /// Number of recorded entries
    pub block: u64,
}

impl CollateralLedger {
    pub fn new(asset: &str) -> Self {
        Self {
            asset: asset.to_string(),
            balances: HashMap::new(),
            transactions: Vec::new(),
            block: 0,
        }
    }

    pub fn balance(&self, owner: &str) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Fund an owner from outside the pool (faucet)
    pub fn deposit(&mut self, owner: &str, amount: u64, timestamp: i64) -> Result<u64, EngineError> {
        if amount == 0 {
            return Err(EngineError::InvalidAmount("deposit must be positive".into()));
        }
        let balance = self.credit(owner, amount)?;
        self.record(Transaction::deposit(owner, amount, timestamp));
        Ok(balance)
    }

    /// Remove collateral from an owner; fails without change on insufficient balance
    pub fn debit(&mut self, owner: &str, amount: u64) -> Result<u64, EngineError> {
        let available = self.balance(owner);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| EngineError::InsufficientBalance {
                owner: owner.to_string(),
                needed: amount,
                available,
            })?;
        self.balances.insert(owner.to_string(), remaining);
        Ok(remaining)
    }

    /// Add collateral to an owner; fails without change on overflow
    pub fn credit(&mut self, owner: &str, amount: u64) -> Result<u64, EngineError> {
        let updated = self
            .balance(owner)
            .checked_add(amount)
            .ok_or_else(|| EngineError::overflow("collateral credit"))?;
        self.balances.insert(owner.to_string(), updated);
        Ok(updated)
    }

    /// Append a journal entry
    pub fn record(&mut self, mut tx: Transaction) -> &Transaction {
        self.block += 1;
        tx.block_number = self.block;
        self.transactions.push(tx);
        &self.transactions[self.transactions.len() - 1]
    }

    /// Journal entries touching an owner, newest first
    pub fn get_transactions(&self, owner: &str, limit: usize) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .rev()
            .filter(|tx| tx.involves(owner))
            .take(limit)
            .collect()
    }

    pub fn recent_transactions(&self, limit: usize) -> Vec<&Transaction> {
        self.transactions.iter().rev().take(limit).collect()
    }

    /// Collateral that entered the system through deposits
    pub fn total_deposited(&self) -> u128 {
        self.transactions
            .iter()
            .filter(|tx| tx.tx_type == TxType::Deposit)
            .map(|tx| tx.amount as u128)
            .sum()
    }

    pub fn stats(&self) -> LedgerStats {
        let total_collateral = self.balances.values().map(|b| *b as u128).sum();
        LedgerStats {
            asset: self.asset.clone(),
            accounts: self.balances.len(),
            transactions: self.transactions.len(),
            block: self.block,
            total_collateral,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerStats {
    pub asset: String,
    pub accounts: usize,
    pub transactions: usize,
    pub block: u64,
    /// Sum of wallet balances (excludes vaults and fee sinks)
    pub total_collateral: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_and_debit() {
        let mut ledger = CollateralLedger::new("USDC");
        ledger.deposit("alice", 1_000, 0).unwrap();
        assert_eq!(ledger.balance("alice"), 1_000);

        assert_eq!(ledger.debit("alice", 400).unwrap(), 600);
        assert_eq!(ledger.balance("alice"), 600);
    }

    #[test]
    fn test_debit_insufficient_leaves_balance() {
        let mut ledger = CollateralLedger::new("USDC");
        ledger.deposit("alice", 100, 0).unwrap();

        let err = ledger.debit("alice", 101).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientBalance { available: 100, .. }));
        assert_eq!(ledger.balance("alice"), 100);
    }

    #[test]
    fn test_credit_overflow() {
        let mut ledger = CollateralLedger::new("USDC");
        ledger.credit("alice", u64::MAX).unwrap();
        assert!(ledger.credit("alice", 1).is_err());
        assert_eq!(ledger.balance("alice"), u64::MAX);
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let mut ledger = CollateralLedger::new("USDC");
        assert!(ledger.deposit("alice", 0, 0).is_err());
        assert_eq!(ledger.stats().transactions, 0);
    }

    #[test]
    fn test_journal_filters_by_owner() {
        let mut ledger = CollateralLedger::new("USDC");
        ledger.deposit("alice", 10, 1).unwrap();
        ledger.deposit("bob", 20, 2).unwrap();
        ledger.deposit("alice", 30, 3).unwrap();

        let txs = ledger.get_transactions("alice", 10);
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].amount, 30);
        assert_eq!(txs[0].block_number, 3);
        assert_eq!(ledger.stats().total_collateral, 60);
    }
}

//! Deterministic account addressing.
//!
//! Every market owns a handful of sub-accounts (vault, one issuer per side and
//! two fee sinks). Their keys are pure functions of the market key and a role
//! seed, so any client can recompute them without asking the engine.
//!
//! ```text
//! market  = sha256("market"   || creator || market_id.to_le_bytes())
//! account = sha256(role_seed  || market)
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const MARKET_SEED: &[u8] = b"market";

/// Role of a market sub-account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Vault,
    ForIssuer,
    AgainstIssuer,
    CreatorFeeSink,
    ProtocolFeeSink,
}

impl AccountRole {
    pub fn seed(&self) -> &'static [u8] {
        match self {
            AccountRole::Vault => b"vault",
            AccountRole::ForIssuer => b"for_mint",
            AccountRole::AgainstIssuer => b"against_mint",
            AccountRole::CreatorFeeSink => b"creator_fee",
            AccountRole::ProtocolFeeSink => b"protocol_fee",
        }
    }
}

/// Key of the market record for a `(creator, market_id)` pair
pub fn market_address(creator: &str, market_id: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(MARKET_SEED);
    hasher.update(creator.as_bytes());
    hasher.update(market_id.to_le_bytes());
    hex::encode(hasher.finalize())
}

/// Key of a market sub-account
pub fn derive_account(market: &str, role: AccountRole) -> String {
    let mut hasher = Sha256::new();
    hasher.update(role.seed());
    hasher.update(market.as_bytes());
    hex::encode(hasher.finalize())
}

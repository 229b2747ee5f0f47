// ============================================================================
// Market Resolve Module - Market lifecycle and settlement
// ============================================================================
//
//   - markets: market creation, trading window, resolution
//   - escrow:  the pooled collateral vault and the fee sinks
//   - claim:   pro-rata payout to winners, refunds for an empty winning side
//   - odds:    informational prices and payout multipliers
//
// ============================================================================

pub mod claim;
pub mod escrow;
pub mod markets;
pub mod odds;

pub use claim::*;
pub use escrow::*;
pub use markets::*;
pub use odds::*;

// ============================================================================
// Engine Errors - Pari-Mutuel Pool Ledger
// ============================================================================
//
// Every rejected operation surfaces one of these synchronously. Rejections
// never leave partial state behind: the engine validates and computes all new
// balances before the first write.
//
// ============================================================================

use serde::Serialize;

/// Coarse error category, used by the service layer to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    State,
    Authorization,
    Arithmetic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    // ----- validation -----
    InvalidFee(u16),
    InvalidDuration(String),
    InvalidQuestion(String),
    InvalidAmount(String),
    InsufficientBalance { owner: String, needed: u64, available: u64 },
    InsufficientShares { owner: String, needed: u64, available: u64 },
    MarketNotFound(String),
    MarketAlreadyExists(String),
    NothingToClaim(String),

    // ----- state -----
    MarketClosed(String),
    MarketNotActive(String),
    AlreadyResolved(String),
    MarketNotResolved(String),
    ResolutionTooEarly { close_time: i64, now: i64 },
    RefundUnavailable(String),

    // ----- authorization -----
    Unauthorized(String),

    // ----- arithmetic -----
    Overflow(String),
    ConservationViolation(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidFee(_)
            | EngineError::InvalidDuration(_)
            | EngineError::InvalidQuestion(_)
            | EngineError::InvalidAmount(_)
            | EngineError::InsufficientBalance { .. }
            | EngineError::InsufficientShares { .. }
            | EngineError::MarketNotFound(_)
            | EngineError::MarketAlreadyExists(_)
            | EngineError::NothingToClaim(_) => ErrorKind::Validation,

            EngineError::MarketClosed(_)
            | EngineError::MarketNotActive(_)
            | EngineError::AlreadyResolved(_)
            | EngineError::MarketNotResolved(_)
            | EngineError::ResolutionTooEarly { .. }
            | EngineError::RefundUnavailable(_) => ErrorKind::State,

            EngineError::Unauthorized(_) => ErrorKind::Authorization,

            EngineError::Overflow(_) | EngineError::ConservationViolation(_) => {
                ErrorKind::Arithmetic
            }
        }
    }

    pub(crate) fn overflow(context: &str) -> Self {
        EngineError::Overflow(format!("arithmetic overflow in {}", context))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidFee(bps) => write!(f, "Invalid fee: {} bps (max 500)", bps),
            EngineError::InvalidDuration(msg) => write!(f, "Invalid duration: {}", msg),
            EngineError::InvalidQuestion(msg) => write!(f, "Invalid question: {}", msg),
            EngineError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            EngineError::InsufficientBalance { owner, needed, available } => write!(
                f,
                "Insufficient balance: {} has {}, needs {}",
                owner, available, needed
            ),
            EngineError::InsufficientShares { owner, needed, available } => write!(
                f,
                "Insufficient side tokens: {} has {}, needs {}",
                owner, available, needed
            ),
            EngineError::MarketNotFound(key) => write!(f, "Market not found: {}", key),
            EngineError::MarketAlreadyExists(key) => write!(f, "Market already exists: {}", key),
            EngineError::NothingToClaim(msg) => write!(f, "Nothing to claim: {}", msg),
            EngineError::MarketClosed(msg) => write!(f, "Market closed: {}", msg),
            EngineError::MarketNotActive(msg) => write!(f, "Market not active: {}", msg),
            EngineError::AlreadyResolved(key) => write!(f, "Market already resolved: {}", key),
            EngineError::MarketNotResolved(key) => write!(f, "Market not resolved: {}", key),
            EngineError::ResolutionTooEarly { close_time, now } => write!(
                f,
                "Market betting period has not ended yet (closes at {}, now {})",
                close_time, now
            ),
            EngineError::RefundUnavailable(msg) => write!(f, "Refund unavailable: {}", msg),
            EngineError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            EngineError::Overflow(msg) => write!(f, "Overflow: {}", msg),
            EngineError::ConservationViolation(msg) => {
                write!(f, "Conservation check failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for EngineError {}

// Configuration for the engine and the HTTP service
//
// Values come from the environment (a `.env` file is loaded first when
// present). Every key has a default so a bare `cargo run` works locally.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// One year, the longest a market may stay open
pub const MAX_MARKET_DURATION_SECS: i64 = 8_760 * 3_600;

/// Settlement engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Collateral asset symbol recorded on every market
    pub collateral_asset: String,
    /// Owner of every market's protocol fee sink
    pub protocol_fee_owner: String,
    /// Shortest allowed market duration (never below 1s)
    pub min_duration_secs: i64,
    pub max_duration_secs: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collateral_asset: "USDC".to_string(),
            protocol_fee_owner: "protocol_treasury".to_string(),
            min_duration_secs: 60,
            max_duration_secs: MAX_MARKET_DURATION_SECS,
        }
    }
}

/// HTTP service settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Where engine state is persisted; `None` keeps everything in memory
    pub state_file: Option<PathBuf>,
    pub faucet_enabled: bool,
    /// Units credited per faucet call (6 decimals)
    pub faucet_amount: u64,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 1234)),
            state_file: Some(PathBuf::from("data/state.json")),
            faucet_enabled: true,
            faucet_amount: 1_000_000_000,
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let defaults = ServerConfig::default();
        let engine_defaults = EngineConfig::default();

        let state_file = match std::env::var("STATE_FILE") {
            Ok(path) if path.trim().is_empty() => None,
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => defaults.state_file,
        };

        let min_duration_secs: i64 =
            env_parse("MIN_MARKET_DURATION_SECS", engine_defaults.min_duration_secs)?;
        if min_duration_secs < 1 {
            return Err("MIN_MARKET_DURATION_SECS must be at least 1".to_string());
        }

        Ok(Self {
            bind_addr: env_parse("BIND_ADDR", defaults.bind_addr)?,
            state_file,
            faucet_enabled: env_parse("FAUCET_ENABLED", defaults.faucet_enabled)?,
            faucet_amount: env_parse("FAUCET_AMOUNT", defaults.faucet_amount)?,
            engine: EngineConfig {
                collateral_asset: std::env::var("COLLATERAL_ASSET")
                    .unwrap_or(engine_defaults.collateral_asset),
                protocol_fee_owner: std::env::var("PROTOCOL_FEE_OWNER")
                    .unwrap_or(engine_defaults.protocol_fee_owner),
                min_duration_secs,
                max_duration_secs: engine_defaults.max_duration_secs,
            },
        })
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("{} has invalid value {:?}: {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 1234);
        assert_eq!(config.engine.min_duration_secs, 60);
        assert_eq!(config.engine.max_duration_secs, 31_536_000);
    }

    #[test]
    fn test_env_parse_reports_key() {
        std::env::set_var("PPL_TEST_FAUCET_AMOUNT", "lots");
        let err = env_parse::<u64>("PPL_TEST_FAUCET_AMOUNT", 1).unwrap_err();
        assert!(err.contains("PPL_TEST_FAUCET_AMOUNT"));
        std::env::remove_var("PPL_TEST_FAUCET_AMOUNT");

        assert_eq!(env_parse::<u64>("PPL_TEST_UNSET_KEY", 7).unwrap(), 7);
    }
}

// Application state shared by every HTTP handler

use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::config::ServerConfig;
use crate::engine::SettlementEngine;

pub type SharedState = Arc<Mutex<AppState>>;

/// Source of the current unix time handed to every engine operation
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Longest the activity feed grows before old entries drop off
pub const MAX_ACTIVITY_ENTRIES: usize = 1000;

pub struct AppState {
    pub engine: SettlementEngine,
    /// Human readable feed served at `/ledger`
    pub activity: Vec<String>,
    pub config: ServerConfig,
    clock: Clock,
}

#[derive(Serialize, Deserialize)]
struct PersistedState {
    engine: SettlementEngine,
    #[serde(default)]
    activity: Vec<String>,
}

impl AppState {
    /// Fresh state, replaced by the persisted one when a state file exists.
    /// An unreadable state file is an error: starting empty would overwrite
    /// it on the next save.
    pub fn new(config: ServerConfig) -> Result<Self, String> {
        Self::with_clock(config, Arc::new(now))
    }

    pub fn with_clock(config: ServerConfig, clock: Clock) -> Result<Self, String> {
        let mut state = Self {
            engine: SettlementEngine::new(config.engine.clone()),
            activity: Vec::new(),
            config,
            clock,
        };

        if state.load_from_disk()? {
            info!(
                markets = state.engine.markets().len(),
                "loaded persisted state from disk"
            );
        } else {
            info!("no persisted state found, starting fresh");
        }

        Ok(state)
    }

    pub fn shared(config: ServerConfig) -> Result<SharedState, String> {
        Ok(Arc::new(Mutex::new(Self::new(config)?)))
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    /// Current unix time according to this state's clock
    pub fn now(&self) -> i64 {
        (self.clock)()
    }

    pub fn save_to_disk(&self) -> Result<(), String> {
        let path = match &self.config.state_file {
            Some(path) => path,
            None => return Ok(()),
        };

        let state = PersistedState {
            engine: self.engine.clone(),
            activity: self.activity.clone(),
        };
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| format!("Failed to serialize state: {}", e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        fs::write(path, json).map_err(|e| format!("Failed to write state file: {}", e))?;

        info!(path = %path.display(), "state saved to disk");
        Ok(())
    }

    /// `Ok(false)` when persistence is off or no file exists yet
    fn load_from_disk(&mut self) -> Result<bool, String> {
        let path = match &self.config.state_file {
            Some(path) if path.exists() => path,
            _ => return Ok(false),
        };

        let json = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let state: PersistedState = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to deserialize state: {}", e))?;

        self.engine = state.engine;
        self.engine.set_config(self.config.engine.clone());
        self.activity = state.activity;
        Ok(true)
    }

    pub fn log_activity(&mut self, emoji: &str, action: &str, details: &str) {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        let entry = format!("[{}] {} {} | {}", timestamp, emoji, action, details);
        info!(target: "activity", "{} {}", action, details);
        self.activity.push(entry);
        if self.activity.len() > MAX_ACTIVITY_ENTRIES {
            let overflow = self.activity.len() - MAX_ACTIVITY_ENTRIES;
            self.activity.drain(..overflow);
        }
    }
}

/// Lock the shared state. A handler that panicked mid-request cannot leave a
/// half-applied operation behind, so a poisoned lock is still usable.
pub fn lock(state: &SharedState) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Persist shared state, releasing the lock before returning
pub fn save_shared(state: &SharedState) -> Result<(), String> {
    let app_state = lock(state);
    let saved = app_state.save_to_disk();
    drop(app_state);
    saved
}

/// Current unix time in seconds
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_resolve::CreateMarketParams;
    use crate::shares::Side;
    use std::path::PathBuf;

    fn in_memory() -> ServerConfig {
        ServerConfig {
            state_file: None,
            ..ServerConfig::default()
        }
    }

    fn temp_state_file() -> PathBuf {
        std::env::temp_dir().join(format!("ppl_state_{}.json", uuid::Uuid::new_v4().simple()))
    }

    fn persisted(path: &PathBuf) -> ServerConfig {
        ServerConfig {
            state_file: Some(path.clone()),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_activity_feed_is_bounded() {
        let mut state = AppState::new(in_memory()).unwrap();
        for i in 0..(MAX_ACTIVITY_ENTRIES + 5) {
            state.log_activity("📝", "TEST", &i.to_string());
        }
        assert_eq!(state.activity.len(), MAX_ACTIVITY_ENTRIES);
        assert!(state.activity[0].ends_with("| 5"));
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_state_file();
        let config = persisted(&path);

        let mut state = AppState::new(config.clone()).unwrap();
        state.engine.deposit_collateral("alice", 500, 0).unwrap();
        let key = state
            .engine
            .create_market(
                CreateMarketParams {
                    creator: "creator".into(),
                    resolver: "creator".into(),
                    market_id: 1,
                    question: "Will the ferry run on Sunday?".into(),
                    duration_seconds: 3_600,
                    fee_bps: 0,
                },
                0,
            )
            .unwrap();
        state.engine.buy(&key, "alice", 200, Side::For, 1).unwrap();
        state.log_activity("🎯", "BUY", "alice");

        let shared = state.into_shared();
        save_shared(&shared).unwrap();

        let reloaded = AppState::new(config).unwrap();
        assert_eq!(reloaded.engine.collateral_balance("alice"), 300);
        assert_eq!(reloaded.engine.position(&key, "alice").unwrap().for_balance, 200);
        assert_eq!(reloaded.activity.len(), 1);
        reloaded.engine.verify_conservation().unwrap();

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_unreadable_state_file_is_kept() {
        let path = temp_state_file();
        let contents = "{\"engine\": {\"markets\": TRUNCATED";
        fs::write(&path, contents).unwrap();

        let err = AppState::new(persisted(&path)).err().unwrap();
        assert!(err.contains("deserialize"));
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_no_state_file_is_noop() {
        let state = AppState::new(in_memory()).unwrap();
        assert!(state.save_to_disk().is_ok());
        assert!(state.engine.markets().is_empty());
    }

    #[test]
    fn test_injected_clock() {
        let state = AppState::with_clock(in_memory(), Arc::new(|| 42)).unwrap();
        assert_eq!(state.now(), 42);
    }
}

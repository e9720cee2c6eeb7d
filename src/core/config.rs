//! Session configuration.
//!
//! Servers configure matches at startup by providing a `SyncConfig`, either
//! built in code or parsed from JSON. Every field has a default, so a partial
//! document only overrides what it names.
//!
//! ```
//! use ludo_sync::core::SyncConfig;
//!
//! let config = SyncConfig::from_json(r#"{ "autoAdvanceDelayMs": 250 }"#).unwrap();
//! assert_eq!(config.auto_advance_delay().as_millis(), 250);
//! assert_eq!(config.max_players, 2);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay before an unplayable roll passes the turn.
pub const DEFAULT_AUTO_ADVANCE_DELAY_MS: u64 = 1_000;

/// Seats per match.
pub const DEFAULT_MAX_PLAYERS: usize = 2;

/// Configuration shared by every match of a server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// How long a player sees an unplayable roll before the turn passes.
    pub auto_advance_delay_ms: u64,

    /// Seats per match. Only two-player matches are supported.
    pub max_players: usize,

    /// Seed for the dice of every match. `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_advance_delay_ms: DEFAULT_AUTO_ADVANCE_DELAY_MS,
            max_players: DEFAULT_MAX_PLAYERS,
            rng_seed: None,
        }
    }
}

impl SyncConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the auto-advance delay.
    #[must_use]
    pub fn with_auto_advance_delay(mut self, delay: Duration) -> Self {
        self.auto_advance_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Seed every match's dice deterministically.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_players != DEFAULT_MAX_PLAYERS {
            return Err(ConfigError::UnsupportedPlayerCount(self.max_players));
        }
        Ok(())
    }
}

/// Invalid configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("only 2-player matches are supported, got {0}")]
    UnsupportedPlayerCount(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::new();
        assert_eq!(config.auto_advance_delay(), Duration::from_secs(1));
        assert_eq!(config.max_players, 2);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn test_builder() {
        let config = SyncConfig::new()
            .with_auto_advance_delay(Duration::from_millis(40))
            .with_rng_seed(9);

        assert_eq!(config.auto_advance_delay_ms, 40);
        assert_eq!(config.rng_seed, Some(9));
    }

    #[test]
    fn test_from_json_partial() {
        let config = SyncConfig::from_json(r#"{"rngSeed": 5}"#).unwrap();
        assert_eq!(config.rng_seed, Some(5));
        assert_eq!(config.auto_advance_delay_ms, DEFAULT_AUTO_ADVANCE_DELAY_MS);
    }

    #[test]
    fn test_from_json_rejects_player_count() {
        let err = SyncConfig::from_json(r#"{"maxPlayers": 4}"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedPlayerCount(4)));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(matches!(
            SyncConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}

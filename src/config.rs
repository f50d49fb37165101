//! Session configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "service": { "base_url": "https://battle.example/api" },
//!   "playback": { "ai_entry_delay_ms": 300 } }
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::battle_log::BattleLogEntry;
use crate::error::ClientError;
use crate::ids::Team;
use crate::pacing::Pacer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// The team driven by the local player. The other team is the AI.
    pub human_team: Team,
    pub playback: PlaybackConfig,
    pub retry: RetryPolicy,
    pub service: ServiceConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            human_team: Team::One,
            playback: PlaybackConfig::default(),
            retry: RetryPolicy::default(),
            service: ServiceConfig::default(),
        }
    }
}

/// Readability pauses during log playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Rest after entries listed in `rest_after`.
    pub rest_delay_ms: u64,
    /// Pause between consecutive entries of an AI turn.
    pub ai_entry_delay_ms: u64,
    /// Action types followed by a rest.
    pub rest_after: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            rest_delay_ms: 400,
            ai_entry_delay_ms: 600,
            rest_after: ["play_card", "damage", "heal", "effect_trigger"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl PlaybackConfig {
    /// No pauses at all.
    pub fn immediate() -> Self {
        Self {
            rest_delay_ms: 0,
            ai_entry_delay_ms: 0,
            rest_after: Vec::new(),
        }
    }

    pub fn rest_delay(&self) -> Duration {
        Duration::from_millis(self.rest_delay_ms)
    }

    pub fn ai_entry_delay(&self) -> Duration {
        Duration::from_millis(self.ai_entry_delay_ms)
    }

    pub fn rests_after(&self, entry: &BattleLogEntry) -> bool {
        let action_type = entry.action_type();
        self.rest_after.iter().any(|t| t == action_type)
    }
}

/// Bounded exponential backoff for idempotent requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait before attempt `attempt + 1`, where `attempt` starts at 1.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis((self.initial_backoff_ms as f64 * factor) as u64)
    }

    /// Run `request`, retrying network failures only.
    pub fn run<T>(
        &self,
        pacer: &mut dyn Pacer,
        mut request: impl FnMut() -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match request() {
                Err(err) if err.is_network() && attempt < attempts => {
                    let wait = self.backoff(attempt);
                    log::warn!("attempt {attempt}/{attempts} failed: {err}; retrying in {wait:?}");
                    pacer.pause(wait);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// Where the battle service lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Parse)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }
}

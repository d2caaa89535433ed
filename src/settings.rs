//! Match settings
//!
//! Static startup configuration: round rules, network tuning and bot
//! difficulty. Loaded once from JSON; everything has a sensible default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Millis;
use crate::error::ConfigError;
use crate::sim::arena::ArenaLayout;

/// Bot difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Like `from_str`, but unknown names are a configuration error
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Self::from_str(s).ok_or_else(|| ConfigError::UnknownDifficulty(s.to_string()))
    }

    /// Starting aggression scalar (0-1)
    pub fn aggression(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Medium => 0.7,
            Difficulty::Hard => 0.9,
        }
    }

    /// Minimum gap between two action ticks
    pub fn action_delay_ms(&self) -> Millis {
        match self {
            Difficulty::Easy => 250,
            Difficulty::Medium => 150,
            Difficulty::Hard => 100,
        }
    }

    /// Minimum gap between two bot ability uses, independent of ability cooldowns
    pub fn ability_gap_ms(&self) -> Millis {
        match self {
            Difficulty::Easy => 3000,
            Difficulty::Medium => 2000,
            Difficulty::Hard => 1500,
        }
    }
}

/// Network tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetSettings {
    /// Interval between outbound state packets
    pub sync_interval_ms: Millis,
    /// Lag-compensation window; packets older than twice this are dropped
    pub lag_compensation_ms: Millis,
    /// Positional divergence that triggers snap + replay
    pub reconcile_threshold: f32,
    /// How close a logged input's timestamp must be to a snapshot's to match
    pub timestamp_tolerance_ms: Millis,
    /// Maximum entries kept in the local input log
    pub input_log_capacity: usize,
}

impl Default for NetSettings {
    fn default() -> Self {
        Self {
            sync_interval_ms: 50,
            lag_compensation_ms: 100,
            reconcile_threshold: 10.0,
            timestamp_tolerance_ms: 50,
            input_log_capacity: 64,
        }
    }
}

impl NetSettings {
    /// Age beyond which a buffered packet is stale
    pub fn stale_after_ms(&self) -> Millis {
        self.lag_compensation_ms * 2
    }
}

/// Automated opponent settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    pub difficulty: Difficulty,
}

/// Complete startup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Seed for every stochastic choice in the match
    pub seed: u64,
    /// Rounds needed to take the match
    pub rounds_to_win: u32,
    /// Countdown before each round goes live
    pub round_start_delay_ms: Millis,
    /// Arena layout used for every round
    pub layout: ArenaLayout,
    pub network: NetSettings,
    pub bot: BotSettings,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            rounds_to_win: 2,
            round_start_delay_ms: 3000,
            layout: ArenaLayout::Classic,
            network: NetSettings::default(),
            bot: BotSettings::default(),
        }
    }
}

impl MatchSettings {
    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: MatchSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&contents)?;
        log::info!(
            "Loaded settings from {} (layout {}, bot {})",
            path.display(),
            settings.layout.as_str(),
            settings.bot.difficulty.as_str()
        );
        Ok(settings)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds_to_win == 0 {
            return Err(ConfigError::Invalid("rounds_to_win must be at least 1".to_string()));
        }
        if self.network.sync_interval_ms == 0 {
            return Err(ConfigError::Invalid("sync_interval_ms must be positive".to_string()));
        }
        if self.network.lag_compensation_ms == 0 {
            return Err(ConfigError::Invalid(
                "lag_compensation_ms must be positive".to_string(),
            ));
        }
        if self.network.reconcile_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "reconcile_threshold must not be negative".to_string(),
            ));
        }
        if self.network.input_log_capacity == 0 {
            return Err(ConfigError::Invalid(
                "input_log_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning() {
        let s = MatchSettings::default();
        assert_eq!(s.rounds_to_win, 2);
        assert_eq!(s.round_start_delay_ms, 3000);
        assert_eq!(s.network.sync_interval_ms, 50);
        assert_eq!(s.network.stale_after_ms(), 200);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = MatchSettings::from_json(r#"{ "rounds_to_win": 3, "layout": "Maze" }"#).unwrap();
        assert_eq!(s.rounds_to_win, 3);
        assert_eq!(s.layout, ArenaLayout::Maze);
        assert_eq!(s.network.lag_compensation_ms, 100);
        assert_eq!(s.bot.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = MatchSettings::from_json(r#"{ "rounds_to_win": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = MatchSettings::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("med"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_str("nightmare"), None);
        assert!(Difficulty::Hard.aggression() > Difficulty::Easy.aggression());
    }
}

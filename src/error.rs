//! Error taxonomy
//!
//! Only construction and transport problems are errors. Per-tick gameplay
//! refusals (ability on cooldown, moving while rooted) are `None` results at
//! the call site, and degenerate geometry resolves to "no intersection".

use thiserror::Error;

use crate::Millis;

/// Fatal configuration problems, raised while building a match
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown archetype '{0}' (expected Vanguard, Ranger or Mage)")]
    UnknownArchetype(String),
    #[error("unknown arena layout '{0}' (expected Classic, Maze or Open)")]
    UnknownLayout(String),
    #[error("unknown difficulty '{0}' (expected Easy, Medium or Hard)")]
    UnknownDifficulty(String),
    #[error("invalid settings: {0}")]
    Invalid(String),
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Network-side failures. None of these halts the simulation.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("packet is {age_ms} ms old (limit {limit_ms} ms)")]
    Stale { age_ms: Millis, limit_ms: Millis },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed room document: {0}")]
    Codec(#[from] serde_json::Error),
}

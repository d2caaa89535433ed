//! Arena Champions - round-based top-down arena combat
//!
//! Core modules:
//! - `sim`: Deterministic simulation (arena, champions, projectiles, bot)
//! - `net`: Client prediction and server reconciliation
//! - `settings`: Startup configuration (round rules, network tuning, bot difficulty)
//! - `error`: Construction and transport errors

pub mod error;
pub mod net;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, NetError};
pub use settings::{Difficulty, MatchSettings, NetSettings};

use glam::Vec2;

/// Milliseconds on the simulation clock. All effect expiry and cooldown
/// bookkeeping compares against an injected `now` of this type.
pub type Millis = u64;

/// Game configuration constants
pub mod consts {
    use crate::Millis;

    /// Fixed simulation timestep
    pub const TICK_MS: Millis = 20;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = TICK_MS as f32 / 1000.0;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 1000.0;
    pub const ARENA_HEIGHT: f32 = 600.0;
    pub const WALL_THICKNESS: f32 = 20.0;
    pub const COVER_HEALTH: f32 = 50.0;

    /// Champion footprint (AABB side length, also the projectile hit radius)
    pub const PLAYER_SIZE: f32 = 20.0;

    /// Base projectile speed (units/s)
    pub const PROJECTILE_SPEED: f32 = 400.0;
    /// Projectile AABB side length
    pub const PROJECTILE_SIZE: f32 = 4.0;

    /// Spawn points for the two combatants
    pub const SPAWN_POINTS: [(f32, f32); 2] = [(100.0, 300.0), (900.0, 300.0)];
}

/// Unit vector from `from` toward `to`, zero when the points coincide
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Angle (radians) of the ray from `from` toward `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit vector for an angle
#[inline]
pub fn from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Clamp a point to a rectangle inset by `margin` on every side
#[inline]
pub fn clamp_to_bounds(p: Vec2, width: f32, height: f32, margin: f32) -> Vec2 {
    Vec2::new(
        p.x.clamp(margin, width - margin),
        p.y.clamp(margin, height - margin),
    )
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Explicit clock (`now` is always passed in)
//! - Stable iteration order (by entity ID)

pub mod archetype;
pub mod arena;
pub mod bot;
pub mod champion;
pub mod collision;
pub mod geometry;
pub mod projectile;
pub mod quadtree;
pub mod state;
pub mod tick;

/// Identifier for champions, projectiles and traps
pub type EntityId = u32;

pub use archetype::{AbilityConfig, Archetype, ArchetypeConfig, PassiveConfig, WeaponKind};
pub use arena::{Arena, ArenaLayout, ArenaView, Cover, Impact, LayoutDescriptor};
pub use bot::{BehaviorPattern, BotContext, BotState, DecisionEngine};
pub use champion::{AbilityResult, AbilitySlot, Champion, Cooldown, Effects};
pub use geometry::Rect;
pub use projectile::{EffectKind, Projectile, ProjectileKind, ShotSpec, Trap, VisualEffect};
pub use quadtree::SpatialIndex;
pub use state::{GameEvent, MatchPhase, MatchState, MatchView, RngState};
pub use tick::{Intent, Movement, TickInput, tick};

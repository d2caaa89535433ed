//! Projectiles, traps and transient visual effects
//!
//! These are owned by the match state and advanced by the tick. Champions
//! only describe what to spawn (`ShotSpec`); ids and ownership are assigned
//! when the spawn is accepted.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::collision::within_radius;
use crate::Millis;

/// Delay between a trap landing and it becoming able to trigger
pub const TRAP_ARM_MS: Millis = 300;
/// How long an untriggered (or spent) trap stays in the world
pub const TRAP_LIFETIME_MS: Millis = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    ShotgunPellet,
    RifleBullet,
    EnergyBolt,
    PiercingShot,
    Fireball,
}

impl ProjectileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectileKind::ShotgunPellet => "shotgun_pellet",
            ProjectileKind::RifleBullet => "rifle_bullet",
            ProjectileKind::EnergyBolt => "energy_bolt",
            ProjectileKind::PiercingShot => "piercing_shot",
            ProjectileKind::Fireball => "fireball",
        }
    }
}

/// Splash payload detonated on impact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaEffect {
    pub radius: f32,
    pub damage: f32,
}

/// A projectile a champion wants to spawn
#[derive(Debug, Clone, PartialEq)]
pub struct ShotSpec {
    pub origin: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub range: f32,
    pub kind: ProjectileKind,
    pub piercing: bool,
    pub aoe: Option<AreaEffect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub owner: EntityId,
    pub kind: ProjectileKind,
    pub position: Vec2,
    /// Where it was fired from; range is measured from here
    pub origin: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub range: f32,
    pub piercing: bool,
    pub aoe: Option<AreaEffect>,
    /// Entities a piercing projectile has already damaged
    #[serde(default)]
    pub hit: Vec<EntityId>,
}

impl Projectile {
    pub fn from_spec(id: EntityId, owner: EntityId, spec: ShotSpec) -> Self {
        Self {
            id,
            owner,
            kind: spec.kind,
            position: spec.origin,
            origin: spec.origin,
            velocity: spec.velocity,
            damage: spec.damage,
            range: spec.range,
            piercing: spec.piercing,
            aoe: spec.aoe,
            hit: Vec::new(),
        }
    }

    #[inline]
    pub fn traveled(&self) -> f32 {
        self.position.distance(self.origin)
    }

    /// Move by `velocity * dt`. Returns false once range is reached; the
    /// position is then pinned to exactly `range` from the origin.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.position += self.velocity * dt;
        if self.traveled() >= self.range {
            self.position = self.origin + self.velocity.normalize_or_zero() * self.range;
            return false;
        }
        true
    }

    /// Carry a remotely fired projectile forward by its transit age
    pub fn fast_forward(&mut self, age_ms: Millis) {
        self.position += self.velocity * (age_ms as f32 / 1000.0);
    }

    /// Whether this projectile may still damage `entity`
    pub fn can_hit(&self, entity: EntityId) -> bool {
        entity != self.owner && !self.hit.contains(&entity)
    }
}

/// Ranger root trap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trap {
    pub id: EntityId,
    pub owner: EntityId,
    pub position: Vec2,
    pub radius: f32,
    pub root_ms: Millis,
    pub reveal_ms: Millis,
    pub placed_at: Millis,
    pub activated: bool,
}

impl Trap {
    pub fn is_armed(&self, now: Millis) -> bool {
        now >= self.placed_at + TRAP_ARM_MS
    }

    pub fn is_expired(&self, now: Millis) -> bool {
        now >= self.placed_at + TRAP_LIFETIME_MS
    }

    /// Age in seconds, for presentation
    pub fn age(&self, now: Millis) -> f32 {
        now.saturating_sub(self.placed_at) as f32 / 1000.0
    }

    /// True if an armed, unspent trap would fire on a champion at `position`
    pub fn triggers_on(&self, now: Millis, target: EntityId, position: Vec2) -> bool {
        !self.activated
            && target != self.owner
            && self.is_armed(now)
            && within_radius(position, self.position, self.radius)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Damage,
    Explosion,
    Charge,
    GroundSlam,
    Teleport,
    TrapActivation,
}

impl EffectKind {
    /// Lifetime in seconds
    pub fn duration(&self) -> f32 {
        match self {
            EffectKind::Damage => 1.0,
            EffectKind::Explosion => 0.5,
            EffectKind::Charge => 0.3,
            EffectKind::GroundSlam => 0.8,
            EffectKind::Teleport => 0.4,
            EffectKind::TrapActivation => 0.6,
        }
    }
}

/// Cosmetic effect; never affects gameplay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualEffect {
    pub kind: EffectKind,
    pub position: Vec2,
    /// Second endpoint for line effects (charge, teleport)
    pub end: Option<Vec2>,
    /// Damage dealt for damage effects, radius for area effects
    pub value: f32,
    pub age: f32,
    pub duration: f32,
}

impl VisualEffect {
    pub fn new(kind: EffectKind, position: Vec2, end: Option<Vec2>, value: f32) -> Self {
        Self {
            kind,
            position,
            end,
            value,
            age: 0.0,
            duration: kind.duration(),
        }
    }

    /// Age the effect; false once it has run its course
    pub fn advance(&mut self, dt: f32) -> bool {
        self.age += dt;
        self.age < self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    fn bolt(range: f32) -> Projectile {
        Projectile::from_spec(
            1,
            7,
            ShotSpec {
                origin: Vec2::ZERO,
                velocity: Vec2::new(PROJECTILE_SPEED, 0.0),
                damage: 10.0,
                range,
                kind: ProjectileKind::EnergyBolt,
                piercing: false,
                aoe: None,
            },
        )
    }

    #[test]
    fn test_range_expiry_is_exact() {
        let mut p = bolt(100.0);
        // 8 units per tick: 12 ticks reach 96
        for _ in 0..12 {
            assert!(p.advance(SIM_DT));
            assert!(p.traveled() < 100.0);
        }
        assert!(!p.advance(SIM_DT));
        assert!((p.traveled() - 100.0).abs() < 1e-4);
        assert!((p.position.x - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_fast_forward() {
        let mut p = bolt(300.0);
        p.fast_forward(100);
        assert!((p.position.x - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_can_hit_excludes_owner_and_previous_hits() {
        let mut p = bolt(300.0);
        assert!(!p.can_hit(7));
        assert!(p.can_hit(2));
        p.hit.push(2);
        assert!(!p.can_hit(2));
    }

    #[test]
    fn test_trap_lifecycle() {
        let trap = Trap {
            id: 5,
            owner: 1,
            position: Vec2::new(100.0, 100.0),
            radius: 40.0,
            root_ms: 2000,
            reveal_ms: 5000,
            placed_at: 1000,
            activated: false,
        };
        let near = Vec2::new(130.0, 100.0);
        // Not armed yet
        assert!(!trap.triggers_on(1100, 2, near));
        assert!(trap.triggers_on(1300, 2, near));
        // Owner never triggers it
        assert!(!trap.triggers_on(1300, 1, near));
        assert!(!trap.triggers_on(1300, 2, Vec2::new(141.0, 100.0)));
        assert!(!trap.is_expired(8999));
        assert!(trap.is_expired(9000));

        let spent = Trap { activated: true, ..trap };
        assert!(!spent.triggers_on(1300, 2, near));
    }

    #[test]
    fn test_visual_effect_expires() {
        let mut fx = VisualEffect::new(EffectKind::Teleport, Vec2::ZERO, None, 0.0);
        assert!(fx.advance(0.2));
        assert!(!fx.advance(0.2));
    }
}

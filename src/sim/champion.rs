//! Champions: stats, status effects, passives, weapon fire and abilities
//!
//! A champion never reads a wall clock. Every time-dependent operation takes
//! the simulation time `now` explicitly, and cooldowns are advanced by the
//! tick's elapsed milliseconds.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::archetype::{AbilityConfig, Archetype, ArchetypeConfig, PassiveConfig, WeaponKind};
use super::projectile::{AreaEffect, ProjectileKind, ShotSpec};
use crate::consts::*;
use crate::{Millis, angle_to, from_angle};

/// Default slow strength when none is given
pub const DEFAULT_SLOW_MULTIPLIER: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilitySlot {
    Q,
    E,
}

impl AbilitySlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbilitySlot::Q => "Q",
            AbilitySlot::E => "E",
        }
    }
}

/// Countdown shared by ability slots and the weapon's fire-rate gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    pub remaining_ms: Millis,
    pub last_used_at: Millis,
}

impl Cooldown {
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.remaining_ms == 0
    }

    pub fn start(&mut self, duration_ms: Millis, now: Millis) {
        self.remaining_ms = duration_ms;
        self.last_used_at = now;
    }

    /// Count down by elapsed time, stopping at zero
    pub fn advance(&mut self, elapsed_ms: Millis) {
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed_ms);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    pub active: bool,
    pub value: f32,
    pub last_damage_at: Millis,
}

/// Timed speed multiplier (boost or slow)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedModifier {
    pub active: bool,
    pub multiplier: f32,
    pub expires_at: Millis,
}

impl Default for SpeedModifier {
    fn default() -> Self {
        Self {
            active: false,
            multiplier: 1.0,
            expires_at: 0,
        }
    }
}

impl SpeedModifier {
    fn apply(&mut self, multiplier: f32, expires_at: Millis) {
        self.active = true;
        self.multiplier = multiplier;
        self.expires_at = expires_at;
    }

    fn expire(&mut self, now: Millis) {
        if self.active && now >= self.expires_at {
            *self = Self::default();
        }
    }

    #[inline]
    fn factor(&self) -> f32 {
        if self.active { self.multiplier } else { 1.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub active: bool,
    pub expires_at: Millis,
}

/// Status-effect set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    pub shield: Shield,
    pub speed_boost: SpeedModifier,
    pub slow: SpeedModifier,
    pub root: Root,
}

/// Outcome of a successful ability use, applied to the world by the tick
#[derive(Debug, Clone, PartialEq)]
pub enum AbilityResult {
    /// Dash to `end`, hitting enemies along the way
    Charge {
        start: Vec2,
        end: Vec2,
        damage: f32,
        knockback: f32,
    },
    /// Damage and slow everything within `radius` of `center`
    GroundSlam {
        center: Vec2,
        radius: f32,
        damage: f32,
        slow_ms: Millis,
        slow_multiplier: f32,
    },
    PiercingShot(ShotSpec),
    /// Place a root trap at `position`
    ScoutTrap {
        position: Vec2,
        radius: f32,
        root_ms: Millis,
        reveal_ms: Millis,
    },
    Fireball(ShotSpec),
    /// Instant move to `end`
    Teleport { start: Vec2, end: Vec2 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Champion {
    pub id: EntityId,
    pub archetype: Archetype,
    pub position: Vec2,
    /// Facing, radians
    pub rotation: f32,
    pub health: f32,
    pub max_health: f32,
    /// Base movement speed (units/s)
    pub speed: f32,
    pub alive: bool,
    pub q: Cooldown,
    pub e: Cooldown,
    pub weapon: Cooldown,
    pub effects: Effects,
    /// Shots in the current empowered-shot streak
    pub attack_count: u32,
    pub last_attack_at: Millis,
}

impl Champion {
    pub fn new(id: EntityId, archetype: Archetype, position: Vec2) -> Self {
        let config = archetype.config();
        let mut champion = Self {
            id,
            archetype,
            position,
            rotation: 0.0,
            health: config.health,
            max_health: config.health,
            speed: config.speed,
            alive: true,
            q: Cooldown::default(),
            e: Cooldown::default(),
            weapon: Cooldown::default(),
            effects: Effects::default(),
            attack_count: 0,
            last_attack_at: 0,
        };
        champion.charge_shield(0);
        champion
    }

    #[inline]
    pub fn config(&self) -> &'static ArchetypeConfig {
        self.archetype.config()
    }

    /// Restore to a fresh state at `position` for a new round
    pub fn reset(&mut self, position: Vec2, now: Millis) {
        self.position = position;
        self.rotation = 0.0;
        self.health = self.max_health;
        self.alive = true;
        self.q = Cooldown::default();
        self.e = Cooldown::default();
        self.weapon = Cooldown::default();
        self.effects = Effects::default();
        self.attack_count = 0;
        self.last_attack_at = now;
        self.charge_shield(now);
    }

    /// Vanguards spawn with a full shield
    fn charge_shield(&mut self, now: Millis) {
        if let PassiveConfig::Shield { value, .. } = self.config().passive {
            self.effects.shield = Shield {
                active: true,
                value,
                last_damage_at: now,
            };
        }
    }

    pub fn cooldown(&self, slot: AbilitySlot) -> &Cooldown {
        match slot {
            AbilitySlot::Q => &self.q,
            AbilitySlot::E => &self.e,
        }
    }

    fn cooldown_mut(&mut self, slot: AbilitySlot) -> &mut Cooldown {
        match slot {
            AbilitySlot::Q => &mut self.q,
            AbilitySlot::E => &mut self.e,
        }
    }

    pub fn ability(&self, slot: AbilitySlot) -> &'static AbilityConfig {
        match slot {
            AbilitySlot::Q => &self.config().q,
            AbilitySlot::E => &self.config().e,
        }
    }

    #[inline]
    pub fn health_pct(&self) -> f32 {
        self.health / self.max_health
    }

    /// Per-tick bookkeeping: cooldowns, effect expiry and passives
    pub fn update(&mut self, now: Millis, elapsed_ms: Millis) {
        self.q.advance(elapsed_ms);
        self.e.advance(elapsed_ms);
        self.weapon.advance(elapsed_ms);

        self.effects.speed_boost.expire(now);
        self.effects.slow.expire(now);
        if self.effects.root.active && now >= self.effects.root.expires_at {
            self.effects.root = Root::default();
        }

        match self.config().passive {
            PassiveConfig::Shield { value, recharge_ms } => {
                let shield = &mut self.effects.shield;
                if !shield.active && now.saturating_sub(shield.last_damage_at) >= recharge_ms {
                    shield.active = true;
                    shield.value = value;
                }
            }
            PassiveConfig::EmpoweredShot { lapse_ms, .. } => {
                if self.attack_count > 0 && now.saturating_sub(self.last_attack_at) >= lapse_ms {
                    self.attack_count = 0;
                }
            }
            PassiveConfig::SpeedBoost { .. } => {}
        }
    }

    /// Apply raw damage; returns the health actually lost.
    ///
    /// An active shield absorbs first. Health floors at zero, which kills.
    pub fn take_damage(&mut self, amount: f32, now: Millis) -> f32 {
        if !self.alive {
            return 0.0;
        }
        let mut amount = amount.max(0.0);

        let shield = &mut self.effects.shield;
        if shield.active {
            let absorbed = amount.min(shield.value);
            amount -= absorbed;
            shield.value -= absorbed;
            if shield.value <= 0.0 {
                shield.active = false;
                shield.value = 0.0;
            }
        }
        shield.last_damage_at = now;

        let lost = amount.min(self.health);
        self.health -= lost;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.alive = false;
        } else if amount > 0.0 {
            self.apply_speed_boost(now);
        }
        lost
    }

    pub fn heal(&mut self, amount: f32) {
        if self.alive {
            self.health = (self.health + amount.max(0.0)).min(self.max_health);
        }
    }

    /// Grant the archetype's speed boost, if it has one
    pub fn apply_speed_boost(&mut self, now: Millis) -> bool {
        if let PassiveConfig::SpeedBoost {
            multiplier,
            duration_ms,
        } = self.config().passive
        {
            self.effects.speed_boost.apply(multiplier, now + duration_ms);
            true
        } else {
            false
        }
    }

    /// Re-applying refreshes duration and strength; slows never stack
    pub fn apply_slow(&mut self, duration_ms: Millis, multiplier: f32, now: Millis) {
        self.effects.slow.apply(multiplier, now + duration_ms);
    }

    pub fn apply_root(&mut self, duration_ms: Millis, now: Millis) {
        self.effects.root = Root {
            active: true,
            expires_at: now + duration_ms,
        };
    }

    #[inline]
    pub fn is_rooted(&self) -> bool {
        self.effects.root.active
    }

    /// base × boost × slow, or 0 while rooted
    pub fn current_speed(&self) -> f32 {
        if self.effects.root.active {
            return 0.0;
        }
        self.speed * self.effects.speed_boost.factor() * self.effects.slow.factor()
    }

    /// Displacement for moving along `direction` for `dt` seconds.
    /// None if the champion cannot move.
    pub fn movement_step(&self, direction: Vec2, dt: f32) -> Option<Vec2> {
        if !self.alive || self.is_rooted() {
            return None;
        }
        Some(direction.normalize_or_zero() * self.current_speed() * dt)
    }

    pub fn can_shoot(&self) -> bool {
        self.alive && self.weapon.is_ready()
    }

    /// Fire the weapon at `target`. None while the fire-rate gate is closed.
    pub fn shoot(&mut self, target: Vec2, now: Millis) -> Option<Vec<ShotSpec>> {
        if !self.can_shoot() {
            return None;
        }
        let weapon = self.config().weapon;
        self.weapon.start(weapon.fire_rate_ms, now);

        let aim = angle_to(self.position, target);
        self.rotation = aim;

        let kind = match weapon.kind {
            WeaponKind::Shotgun => ProjectileKind::ShotgunPellet,
            WeaponKind::Rifle => ProjectileKind::RifleBullet,
            WeaponKind::EnergyBolt => ProjectileKind::EnergyBolt,
        };
        let pellets = weapon.pellets.max(1);
        let spread = weapon.spread_deg.to_radians();
        let center = (pellets - 1) as f32 / 2.0;

        let mut shots: Vec<ShotSpec> = (0..pellets)
            .map(|i| {
                let angle = aim + (i as f32 - center) * (spread / pellets as f32);
                ShotSpec {
                    origin: self.position,
                    velocity: from_angle(angle) * PROJECTILE_SPEED,
                    damage: weapon.damage,
                    range: weapon.range,
                    kind,
                    piercing: false,
                    aoe: None,
                }
            })
            .collect();

        if let PassiveConfig::EmpoweredShot {
            every,
            damage,
            radius,
            ..
        } = self.config().passive
        {
            self.attack_count += 1;
            self.last_attack_at = now;
            if self.attack_count >= every {
                self.attack_count = 0;
                for shot in &mut shots {
                    shot.aoe = Some(AreaEffect { radius, damage });
                }
            }
        }

        Some(shots)
    }

    /// Use the ability in `slot` aimed at `target`.
    /// None if dead or the slot is still cooling down.
    pub fn use_ability(
        &mut self,
        slot: AbilitySlot,
        target: Vec2,
        now: Millis,
    ) -> Option<AbilityResult> {
        if !self.alive || !self.cooldown(slot).is_ready() {
            return None;
        }
        let ability = *self.ability(slot);
        self.cooldown_mut(slot).start(ability.cooldown_ms(), now);

        let from = self.position;
        let aim = angle_to(from, target);
        let toward = |range: f32| from + from_angle(aim) * range.min(from.distance(target));

        let result = match ability {
            AbilityConfig::Charge {
                range,
                damage,
                knockback,
                ..
            } => AbilityResult::Charge {
                start: from,
                end: toward(range),
                damage,
                knockback,
            },
            AbilityConfig::GroundSlam {
                radius,
                damage,
                slow_ms,
                slow_multiplier,
                ..
            } => AbilityResult::GroundSlam {
                center: from,
                radius,
                damage,
                slow_ms,
                slow_multiplier,
            },
            AbilityConfig::PiercingShot {
                damage,
                range,
                speed_scale,
                ..
            } => AbilityResult::PiercingShot(ShotSpec {
                origin: from,
                velocity: from_angle(aim) * PROJECTILE_SPEED * speed_scale,
                damage,
                range,
                kind: ProjectileKind::PiercingShot,
                piercing: true,
                aoe: None,
            }),
            AbilityConfig::ScoutTrap {
                radius,
                root_ms,
                reveal_ms,
                ..
            } => AbilityResult::ScoutTrap {
                position: target,
                radius,
                root_ms,
                reveal_ms,
            },
            AbilityConfig::Fireball {
                damage,
                range,
                radius,
                speed_scale,
                ..
            } => AbilityResult::Fireball(ShotSpec {
                origin: from,
                velocity: from_angle(aim) * PROJECTILE_SPEED * speed_scale,
                damage,
                range,
                kind: ProjectileKind::Fireball,
                piercing: false,
                aoe: Some(AreaEffect { radius, damage }),
            }),
            AbilityConfig::Teleport { range, .. } => AbilityResult::Teleport {
                start: from,
                end: toward(range),
            },
        };

        self.rotation = aim;
        Some(result)
    }
}

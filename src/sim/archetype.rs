//! Champion archetypes and their static stat blocks
//!
//! Every number a champion needs (stats, weapon, passive, both abilities)
//! lives in one `ArchetypeConfig` per archetype, looked up by an exhaustive
//! match.

use serde::{Deserialize, Serialize};

use crate::Millis;
use crate::error::ConfigError;

/// The three combatant classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Vanguard,
    Ranger,
    Mage,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Vanguard, Archetype::Ranger, Archetype::Mage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Vanguard => "Vanguard",
            Archetype::Ranger => "Ranger",
            Archetype::Mage => "Mage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vanguard" => Some(Archetype::Vanguard),
            "ranger" => Some(Archetype::Ranger),
            "mage" => Some(Archetype::Mage),
            _ => None,
        }
    }

    /// Strict lookup; an unknown name never falls back to a default class
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Self::from_str(s).ok_or_else(|| ConfigError::UnknownArchetype(s.to_string()))
    }

    pub fn config(&self) -> &'static ArchetypeConfig {
        match self {
            Archetype::Vanguard => &VANGUARD,
            Archetype::Ranger => &RANGER,
            Archetype::Mage => &MAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    Shotgun,
    Rifle,
    EnergyBolt,
}

#[derive(Debug, Clone, Copy)]
pub struct WeaponConfig {
    pub kind: WeaponKind,
    pub damage: f32,
    pub range: f32,
    /// Minimum gap between shots
    pub fire_rate_ms: Millis,
    /// Total fan angle in degrees (0 for single-projectile weapons)
    pub spread_deg: f32,
    pub pellets: u32,
}

#[derive(Debug, Clone, Copy)]
pub enum PassiveConfig {
    /// Absorbs damage; recharges to `value` after `recharge_ms` without damage
    Shield { value: f32, recharge_ms: Millis },
    /// Speed multiplier granted when damaged
    SpeedBoost { multiplier: f32, duration_ms: Millis },
    /// Every `every`-th shot carries an area payload. The streak lapses after
    /// `lapse_ms` without firing.
    EmpoweredShot {
        every: u32,
        damage: f32,
        radius: f32,
        lapse_ms: Millis,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum AbilityConfig {
    Charge {
        cooldown_ms: Millis,
        range: f32,
        damage: f32,
        knockback: f32,
    },
    GroundSlam {
        cooldown_ms: Millis,
        radius: f32,
        damage: f32,
        slow_ms: Millis,
        slow_multiplier: f32,
    },
    PiercingShot {
        cooldown_ms: Millis,
        damage: f32,
        range: f32,
        speed_scale: f32,
    },
    ScoutTrap {
        cooldown_ms: Millis,
        radius: f32,
        root_ms: Millis,
        reveal_ms: Millis,
    },
    Fireball {
        cooldown_ms: Millis,
        damage: f32,
        range: f32,
        radius: f32,
        speed_scale: f32,
    },
    Teleport {
        cooldown_ms: Millis,
        range: f32,
    },
}

impl AbilityConfig {
    pub fn cooldown_ms(&self) -> Millis {
        match *self {
            AbilityConfig::Charge { cooldown_ms, .. }
            | AbilityConfig::GroundSlam { cooldown_ms, .. }
            | AbilityConfig::PiercingShot { cooldown_ms, .. }
            | AbilityConfig::ScoutTrap { cooldown_ms, .. }
            | AbilityConfig::Fireball { cooldown_ms, .. }
            | AbilityConfig::Teleport { cooldown_ms, .. } => cooldown_ms,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AbilityConfig::Charge { .. } => "Charge",
            AbilityConfig::GroundSlam { .. } => "Ground Slam",
            AbilityConfig::PiercingShot { .. } => "Piercing Shot",
            AbilityConfig::ScoutTrap { .. } => "Scout Trap",
            AbilityConfig::Fireball { .. } => "Fireball",
            AbilityConfig::Teleport { .. } => "Teleport",
        }
    }
}

/// Full static description of an archetype
#[derive(Debug, Clone, Copy)]
pub struct ArchetypeConfig {
    pub role: &'static str,
    pub health: f32,
    pub speed: f32,
    pub weapon: WeaponConfig,
    pub passive: PassiveConfig,
    pub q: AbilityConfig,
    pub e: AbilityConfig,
}

static VANGUARD: ArchetypeConfig = ArchetypeConfig {
    role: "Tank",
    health: 120.0,
    speed: 180.0,
    weapon: WeaponConfig {
        kind: WeaponKind::Shotgun,
        damage: 25.0,
        range: 150.0,
        fire_rate_ms: 800,
        spread_deg: 30.0,
        pellets: 3,
    },
    passive: PassiveConfig::Shield {
        value: 30.0,
        recharge_ms: 5000,
    },
    q: AbilityConfig::Charge {
        cooldown_ms: 8000,
        range: 200.0,
        damage: 40.0,
        knockback: 150.0,
    },
    e: AbilityConfig::GroundSlam {
        cooldown_ms: 12000,
        radius: 120.0,
        damage: 30.0,
        slow_ms: 3000,
        slow_multiplier: 0.5,
    },
};

static RANGER: ArchetypeConfig = ArchetypeConfig {
    role: "Marksman",
    health: 80.0,
    speed: 220.0,
    weapon: WeaponConfig {
        kind: WeaponKind::Rifle,
        damage: 35.0,
        range: 400.0,
        fire_rate_ms: 1200,
        spread_deg: 0.0,
        pellets: 1,
    },
    passive: PassiveConfig::SpeedBoost {
        multiplier: 1.5,
        duration_ms: 2000,
    },
    q: AbilityConfig::PiercingShot {
        cooldown_ms: 6000,
        damage: 60.0,
        range: 500.0,
        speed_scale: 1.5,
    },
    e: AbilityConfig::ScoutTrap {
        cooldown_ms: 10000,
        radius: 40.0,
        root_ms: 2000,
        reveal_ms: 5000,
    },
};

static MAGE: ArchetypeConfig = ArchetypeConfig {
    role: "Burst Caster",
    health: 90.0,
    speed: 200.0,
    weapon: WeaponConfig {
        kind: WeaponKind::EnergyBolt,
        damage: 30.0,
        range: 300.0,
        fire_rate_ms: 600,
        spread_deg: 0.0,
        pellets: 1,
    },
    passive: PassiveConfig::EmpoweredShot {
        every: 4,
        damage: 20.0,
        radius: 80.0,
        lapse_ms: 5000,
    },
    q: AbilityConfig::Fireball {
        cooldown_ms: 4000,
        damage: 50.0,
        range: 350.0,
        radius: 100.0,
        speed_scale: 0.8,
    },
    e: AbilityConfig::Teleport {
        cooldown_ms: 8000,
        range: 250.0,
    },
};

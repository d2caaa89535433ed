//! Room document shape
//!
//! What the pub/sub backend stores per room: every player's position,
//! health, cooldowns and effect flags, the live projectile list and the
//! cover health list. The core both consumes and produces this shape.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Millis;
use crate::error::NetError;
use crate::sim::projectile::AreaEffect;
use crate::sim::{Archetype, Champion, Effects, EntityId, MatchState, Projectile, ProjectileKind};

/// One player's entry in the room document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: EntityId,
    pub archetype: Archetype,
    pub position: Vec2,
    pub rotation: f32,
    pub health: f32,
    pub alive: bool,
    pub q_cooldown_ms: Millis,
    pub e_cooldown_ms: Millis,
    pub effects: Effects,
    /// Sender clock when this entry was written
    pub timestamp: Millis,
}

impl From<&Champion> for PlayerSnapshot {
    fn from(c: &Champion) -> Self {
        Self {
            id: c.id,
            archetype: c.archetype,
            position: c.position,
            rotation: c.rotation,
            health: c.health,
            alive: c.alive,
            q_cooldown_ms: c.q.remaining_ms,
            e_cooldown_ms: c.e.remaining_ms,
            effects: c.effects,
            timestamp: 0,
        }
    }
}

impl PlayerSnapshot {
    pub fn capture(champion: &Champion, now: Millis) -> Self {
        Self {
            timestamp: now,
            ..Self::from(champion)
        }
    }
}

/// Point-in-time copy of a whole room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub timestamp: Millis,
    pub round: u32,
    pub scores: Vec<(EntityId, u32)>,
    pub players: Vec<PlayerSnapshot>,
    #[serde(default)]
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Health per cover piece, by arena index
    #[serde(default)]
    pub cover_health: Vec<f32>,
}

/// Projectile entry; enough to rebuild and dead-reckon it locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: EntityId,
    pub owner: EntityId,
    pub position: Vec2,
    pub origin: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub range: f32,
    pub piercing: bool,
    pub aoe_radius: Option<f32>,
    pub aoe_damage: Option<f32>,
    pub kind: ProjectileKind,
    /// Entities a piercing projectile already struck
    #[serde(default)]
    pub hit: Vec<EntityId>,
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            owner: p.owner,
            position: p.position,
            origin: p.origin,
            velocity: p.velocity,
            damage: p.damage,
            range: p.range,
            piercing: p.piercing,
            aoe_radius: p.aoe.map(|a| a.radius),
            aoe_damage: p.aoe.map(|a| a.damage),
            kind: p.kind,
            hit: p.hit.clone(),
        }
    }
}

impl ProjectileSnapshot {
    /// Rebuild the projectile, carried forward by `age_ms` of transit
    pub fn to_projectile(&self, age_ms: Millis) -> Projectile {
        let aoe = match (self.aoe_radius, self.aoe_damage) {
            (Some(radius), Some(damage)) => Some(AreaEffect { radius, damage }),
            _ => None,
        };
        let mut projectile = Projectile {
            id: self.id,
            owner: self.owner,
            kind: self.kind,
            position: self.position,
            origin: self.origin,
            velocity: self.velocity,
            damage: self.damage,
            range: self.range,
            piercing: self.piercing,
            aoe,
            hit: self.hit.clone(),
        };
        projectile.fast_forward(age_ms);
        projectile
    }
}

impl RoomSnapshot {
    /// Capture the whole match for publishing
    pub fn capture(state: &MatchState) -> Self {
        Self {
            timestamp: state.now,
            round: state.round,
            scores: state.scores.iter().map(|(&id, &s)| (id, s)).collect(),
            players: state
                .champions
                .iter()
                .map(|c| PlayerSnapshot::capture(c, state.now))
                .collect(),
            projectiles: state.projectiles.iter().map(ProjectileSnapshot::from).collect(),
            cover_health: state.arena.cover().iter().map(|c| c.health).collect(),
        }
    }

    pub fn player(&self, id: EntityId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn to_json(&self) -> Result<String, NetError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, NetError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MatchSettings;
    use crate::sim::projectile::ShotSpec;

    #[test]
    fn test_capture_covers_every_player_and_cover_piece() {
        let state = MatchState::new(
            MatchSettings::default(),
            [Archetype::Vanguard, Archetype::Ranger],
        );
        let snap = RoomSnapshot::capture(&state);
        assert_eq!(snap.players.len(), 2);
        assert_eq!(snap.cover_health.len(), 5);
        assert_eq!(snap.player(2).map(|p| p.archetype), Some(Archetype::Ranger));
        assert!(snap.player(1).is_some_and(|p| p.effects.shield.active));
    }

    #[test]
    fn test_json_keeps_aoe_payload() {
        let fireball = Projectile::from_spec(
            4,
            2,
            ShotSpec {
                origin: Vec2::new(100.0, 100.0),
                velocity: Vec2::new(320.0, 0.0),
                damage: 50.0,
                range: 350.0,
                kind: ProjectileKind::Fireball,
                piercing: false,
                aoe: Some(AreaEffect {
                    radius: 100.0,
                    damage: 50.0,
                }),
            },
        );
        let snap = RoomSnapshot {
            timestamp: 10,
            round: 1,
            scores: vec![(1, 0), (2, 0)],
            players: Vec::new(),
            projectiles: vec![ProjectileSnapshot::from(&fireball)],
            cover_health: vec![50.0],
        };
        let back = RoomSnapshot::from_json(&snap.to_json().unwrap()).unwrap();
        let rebuilt = back.projectiles[0].to_projectile(0);
        assert_eq!(rebuilt.aoe, fireball.aoe);
        assert_eq!(rebuilt.kind, ProjectileKind::Fireball);
    }

    #[test]
    fn test_rebuilt_projectile_is_dead_reckoned() {
        let snap = ProjectileSnapshot {
            id: 1,
            owner: 2,
            position: Vec2::new(100.0, 100.0),
            origin: Vec2::new(100.0, 100.0),
            velocity: Vec2::new(0.0, 400.0),
            damage: 30.0,
            range: 300.0,
            piercing: false,
            aoe_radius: None,
            aoe_damage: None,
            kind: ProjectileKind::EnergyBolt,
            hit: Vec::new(),
        };
        let p = snap.to_projectile(50);
        assert!((p.position.y - 120.0).abs() < 1e-4);
        assert_eq!(p.origin, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_partial_document_defaults_lists() {
        let json = r#"{"timestamp":5,"round":1,"scores":[],"players":[]}"#;
        let snap = RoomSnapshot::from_json(json).unwrap();
        assert!(snap.projectiles.is_empty());
        assert!(snap.cover_health.is_empty());
    }
}

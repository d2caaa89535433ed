//! Match state and core simulation types
//!
//! Everything the tick mutates lives in `MatchState`; nothing is global.

use std::collections::BTreeMap;

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::archetype::Archetype;
use super::arena::{Arena, ArenaView};
use super::bot::{BotState, DecisionEngine};
use super::champion::{AbilitySlot, Champion, Effects};
use super::projectile::{Projectile, ProjectileKind, Trap, VisualEffect};
use crate::Millis;
use crate::consts::*;
use crate::error::ConfigError;
use crate::settings::MatchSettings;

/// How long the round result is held before the next countdown starts
pub const ROUND_OVER_HOLD_MS: Millis = 1000;

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Champions are placed; nothing moves until `until`
    Countdown { until: Millis },
    /// Live combat
    Active,
    /// Round decided; next countdown starts at `until`
    RoundOver {
        until: Millis,
        winner: Option<EntityId>,
    },
    /// Someone reached the round target
    MatchOver { winner: Option<EntityId> },
}

impl MatchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::Countdown { .. } => "countdown",
            MatchPhase::Active => "active",
            MatchPhase::RoundOver { .. } => "round_over",
            MatchPhase::MatchOver { .. } => "match_over",
        }
    }
}

/// Events emitted by the simulation for presentation/network collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ShotFired {
        owner: EntityId,
        pellets: usize,
        empowered: bool,
    },
    AbilityUsed {
        owner: EntityId,
        slot: AbilitySlot,
        target: Vec2,
    },
    Damage {
        target: EntityId,
        source: Option<EntityId>,
        amount: f32,
    },
    Death {
        id: EntityId,
    },
    CoverDestroyed {
        index: usize,
    },
    /// `target` is rooted and stays revealed for `reveal_ms`
    TrapTriggered {
        trap: EntityId,
        target: EntityId,
        reveal_ms: Millis,
    },
    RoundEnded {
        round: u32,
        winner: Option<EntityId>,
    },
    MatchEnded {
        winner: Option<EntityId>,
    },
}

/// RNG state wrapper; every stochastic consumer gets its own stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Independent generator for `stream`
    pub fn stream(&self, stream: u64) -> Pcg32 {
        Pcg32::new(self.seed, stream)
    }
}

/// Complete match state
#[derive(Debug, Clone)]
pub struct MatchState {
    pub settings: MatchSettings,
    pub rng_state: RngState,
    /// Simulation clock
    pub now: Millis,
    /// 1-based round number
    pub round: u32,
    pub phase: MatchPhase,
    pub arena: Arena,
    /// Sorted by id
    pub champions: Vec<Champion>,
    pub projectiles: Vec<Projectile>,
    pub traps: Vec<Trap>,
    pub effects: Vec<VisualEffect>,
    /// Rounds won per champion
    pub scores: BTreeMap<EntityId, u32>,
    /// Automated opponents, keyed by the champion they drive
    pub bots: Vec<DecisionEngine>,
    events: Vec<GameEvent>,
    next_id: EntityId,
}

impl MatchState {
    /// Two champions at the spawn points, first round in countdown
    pub fn new(settings: MatchSettings, roster: [Archetype; 2]) -> Self {
        let arena = Arena::new(settings.layout);
        let rng_state = RngState::new(settings.seed);
        let mut state = Self {
            settings,
            rng_state,
            now: 0,
            round: 1,
            phase: MatchPhase::Active,
            arena,
            champions: Vec::with_capacity(2),
            projectiles: Vec::new(),
            traps: Vec::new(),
            effects: Vec::new(),
            scores: BTreeMap::new(),
            bots: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        };

        for (archetype, (x, y)) in roster.into_iter().zip(SPAWN_POINTS) {
            let id = state.next_entity_id();
            state.champions.push(Champion::new(id, archetype, Vec2::new(x, y)));
            state.scores.insert(id, 0);
        }
        state.phase = MatchPhase::Countdown {
            until: state.settings.round_start_delay_ms,
        };
        log::info!(
            "Match created: {} vs {} on {} (first to {})",
            roster[0].as_str(),
            roster[1].as_str(),
            state.settings.layout.as_str(),
            state.settings.rounds_to_win
        );
        state
    }

    /// Like `new`, resolving archetypes by name
    pub fn from_names(settings: MatchSettings, roster: [&str; 2]) -> Result<Self, ConfigError> {
        let first = Archetype::parse(roster[0])?;
        let second = Archetype::parse(roster[1])?;
        Ok(Self::new(settings, [first, second]))
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Hand control of champion `id` to a decision engine
    pub fn add_bot(&mut self, id: EntityId) -> bool {
        let Some(champion) = self.champion(id) else {
            return false;
        };
        if self.is_bot(id) {
            return false;
        }
        let archetype = champion.archetype;
        let rng = self.rng_state.stream(id as u64);
        self.bots.push(DecisionEngine::new(
            id,
            archetype,
            self.settings.bot.difficulty,
            rng,
        ));
        true
    }

    pub fn is_bot(&self, id: EntityId) -> bool {
        self.bots.iter().any(|b| b.id == id)
    }

    pub fn champion(&self, id: EntityId) -> Option<&Champion> {
        self.champions.iter().find(|c| c.id == id)
    }

    pub fn champion_mut(&mut self, id: EntityId) -> Option<&mut Champion> {
        self.champions.iter_mut().find(|c| c.id == id)
    }

    /// The other combatant
    pub fn opponent_of(&self, id: EntityId) -> Option<&Champion> {
        self.champions.iter().find(|c| c.id != id)
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, MatchPhase::MatchOver { .. })
    }

    /// Reset everything round-scoped and start the countdown
    pub fn start_next_round(&mut self) {
        self.round += 1;
        self.arena.repair_all_cover();
        for (champion, (x, y)) in self.champions.iter_mut().zip(SPAWN_POINTS) {
            champion.reset(Vec2::new(x, y), self.now);
        }
        self.projectiles.clear();
        self.traps.clear();
        self.effects.clear();
        for bot in &mut self.bots {
            bot.reset();
        }
        self.phase = MatchPhase::Countdown {
            until: self.now + self.settings.round_start_delay_ms,
        };
        log::info!("Round {} starting", self.round);
    }

    /// Score the round if at most one champion is standing
    pub fn check_round_end(&mut self) {
        if self.phase != MatchPhase::Active {
            return;
        }
        let mut alive = self.champions.iter().filter(|c| c.alive);
        let winner = match (alive.next(), alive.next()) {
            (Some(_), Some(_)) => return,
            (Some(survivor), None) => Some(survivor.id),
            _ => None,
        };

        let round = self.round;
        self.push_event(GameEvent::RoundEnded { round, winner });

        let champion_score = winner.map(|id| {
            let score = self.scores.entry(id).or_insert(0);
            *score += 1;
            *score
        });
        log::info!("Round {} over, winner {:?} (scores {:?})", round, winner, self.scores);

        if champion_score.is_some_and(|s| s >= self.settings.rounds_to_win) {
            self.phase = MatchPhase::MatchOver { winner };
            self.push_event(GameEvent::MatchEnded { winner });
            log::info!("Match over, winner {:?}", winner);
        } else {
            self.phase = MatchPhase::RoundOver {
                until: self.now + ROUND_OVER_HOLD_MS,
                winner,
            };
        }
    }

    /// Read-only snapshot for presentation
    pub fn view(&self) -> MatchView {
        MatchView {
            now: self.now,
            round: self.round,
            phase: self.phase,
            scores: self.scores.iter().map(|(&id, &s)| (id, s)).collect(),
            arena: self.arena.view(),
            champions: self
                .champions
                .iter()
                .map(|c| ChampionView {
                    id: c.id,
                    archetype: c.archetype,
                    position: c.position,
                    rotation: c.rotation,
                    health: c.health,
                    max_health: c.max_health,
                    alive: c.alive,
                    effects: c.effects,
                    q_cooldown_ms: c.q.remaining_ms,
                    e_cooldown_ms: c.e.remaining_ms,
                    bot_state: self.bots.iter().find(|b| b.id == c.id).map(|b| b.state),
                })
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    id: p.id,
                    owner: p.owner,
                    kind: p.kind,
                    position: p.position,
                    velocity: p.velocity,
                })
                .collect(),
            effects: self.effects.clone(),
            traps: self
                .traps
                .iter()
                .map(|t| TrapView {
                    id: t.id,
                    position: t.position,
                    radius: t.radius,
                    activated: t.activated,
                    age: t.age(self.now),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChampionView {
    pub id: EntityId,
    pub archetype: Archetype,
    pub position: Vec2,
    pub rotation: f32,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    pub effects: Effects,
    pub q_cooldown_ms: Millis,
    pub e_cooldown_ms: Millis,
    pub bot_state: Option<BotState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub id: EntityId,
    pub owner: EntityId,
    pub kind: ProjectileKind,
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrapView {
    pub id: EntityId,
    pub position: Vec2,
    pub radius: f32,
    pub activated: bool,
    /// Seconds since placement
    pub age: f32,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub now: Millis,
    pub round: u32,
    pub phase: MatchPhase,
    pub scores: Vec<(EntityId, u32)>,
    pub arena: ArenaView,
    pub champions: Vec<ChampionView>,
    pub projectiles: Vec<ProjectileView>,
    pub effects: Vec<VisualEffect>,
    pub traps: Vec<TrapView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duel() -> MatchState {
        MatchState::new(MatchSettings::default(), [Archetype::Vanguard, Archetype::Mage])
    }

    #[test]
    fn test_new_match_layout() {
        let state = duel();
        assert_eq!(state.champions.len(), 2);
        assert_eq!(state.champions[0].id, 1);
        assert_eq!(state.champions[1].position, Vec2::new(900.0, 300.0));
        assert_eq!(state.phase, MatchPhase::Countdown { until: 3000 });
        assert_eq!(state.opponent_of(1).map(|c| c.id), Some(2));
    }

    #[test]
    fn test_unknown_archetype_is_fatal() {
        let err = MatchState::from_names(MatchSettings::default(), ["Ranger", "Necromancer"])
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownArchetype(_)));
    }

    #[test]
    fn test_add_bot_once() {
        let mut state = duel();
        assert!(state.add_bot(2));
        assert!(!state.add_bot(2));
        assert!(!state.add_bot(99));
        assert!(state.is_bot(2));
    }

    #[test]
    fn test_round_end_scores_and_resets() {
        let mut state = duel();
        state.phase = MatchPhase::Active;
        state.champions[1].take_damage(1000.0, 0);
        state.check_round_end();

        assert_eq!(state.scores[&1], 1);
        assert!(matches!(state.phase, MatchPhase::RoundOver { winner: Some(1), .. }));
        assert!(state.drain_events().contains(&GameEvent::RoundEnded {
            round: 1,
            winner: Some(1)
        }));

        state.start_next_round();
        assert_eq!(state.round, 2);
        assert!(state.champions.iter().all(|c| c.alive && c.health == c.max_health));
        assert!(matches!(state.phase, MatchPhase::Countdown { .. }));
    }

    #[test]
    fn test_match_over_at_target() {
        let mut state = duel();
        state.scores.insert(1, 1);
        state.phase = MatchPhase::Active;
        state.champions[1].take_damage(1000.0, 0);
        state.check_round_end();
        assert_eq!(state.phase, MatchPhase::MatchOver { winner: Some(1) });
        assert!(state.is_over());
    }

    #[test]
    fn test_double_knockout_scores_nobody() {
        let mut state = duel();
        state.phase = MatchPhase::Active;
        for c in &mut state.champions {
            c.take_damage(1000.0, 0);
        }
        state.check_round_end();
        assert!(state.scores.values().all(|&s| s == 0));
        assert!(matches!(state.phase, MatchPhase::RoundOver { winner: None, .. }));
    }

    #[test]
    fn test_view_reports_cover_health() {
        let state = duel();
        let view = state.view();
        assert_eq!(view.champions.len(), 2);
        assert!(view.arena.cover.iter().all(|c| c.health_pct == 1.0));
    }
}

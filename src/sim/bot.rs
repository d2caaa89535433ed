//! Automated opponent
//!
//! A `DecisionEngine` drives one champion. It runs on two clocks: a coarse
//! decision tick picks a `BotState`, and a finer, rate-limited action tick
//! carries that state out. Between action ticks the last chosen heading is
//! held so movement stays smooth at the simulation rate.
//!
//! The engine never touches the world. It reads a `BotContext` and returns an
//! `Intent` that the tick applies like any player input.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::archetype::Archetype;
use super::arena::Arena;
use super::champion::{AbilitySlot, Champion};
use super::projectile::Projectile;
use super::tick::{Intent, Movement};
use crate::consts::*;
use crate::settings::Difficulty;
use crate::{Millis, clamp_to_bounds, direction};

/// Gap between two decision ticks
pub const DECISION_INTERVAL_MS: Millis = 200;
/// Health fraction below which the bot falls back
pub const RETREAT_HEALTH_PCT: f32 = 0.30;
/// Damage this recent also forces a retreat
pub const RECENT_DAMAGE_MS: Millis = 1000;
/// Hostile projectiles closer than this push the bot away
pub const AVOIDANCE_RADIUS: f32 = 80.0;
/// How many tracking intervals ahead the opponent is extrapolated
pub const LOOKAHEAD: f32 = 3.0;
/// Step used when repositioning toward or away from the opponent
pub const REPOSITION_STEP: f32 = 100.0;
/// Distance kept from the arena edge for movement targets
pub const BOUNDS_MARGIN: f32 = 50.0;
/// Inset of the corner fallback positions
pub const CORNER_INSET: f32 = 100.0;
/// How far a direct retreat runs
pub const RETREAT_DISTANCE: f32 = 200.0;
/// Distance in front of the bot at which shots are aimed
pub const AIM_DISTANCE: f32 = 100.0;

// Steering blend weights
const SEEK_WEIGHT: f32 = 0.6;
const STRAFE_WEIGHT: f32 = 0.3;
const AVOID_WEIGHT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BotState {
    #[default]
    Idle,
    Moving,
    Attacking,
    Retreating,
    UsingAbility,
}

impl BotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotState::Idle => "idle",
            BotState::Moving => "moving",
            BotState::Attacking => "attacking",
            BotState::Retreating => "retreating",
            BotState::UsingAbility => "using_ability",
        }
    }
}

/// Per-archetype tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorPattern {
    pub preferred_range: f32,
    pub retreat_range: f32,
    pub aggression_bonus: f32,
    /// Base probability of trying an ability on a decision tick
    pub ability_usage: f32,
    /// Fraction of the champion's speed the bot moves at
    pub movement_speed: f32,
    pub strafe_frequency: f32,
}

impl BehaviorPattern {
    pub fn for_archetype(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Vanguard => Self {
                preferred_range: 120.0,
                retreat_range: 300.0,
                aggression_bonus: 0.3,
                ability_usage: 0.8,
                movement_speed: 0.8,
                strafe_frequency: 0.3,
            },
            Archetype::Ranger => Self {
                preferred_range: 250.0,
                retreat_range: 150.0,
                aggression_bonus: 0.1,
                ability_usage: 0.6,
                movement_speed: 1.0,
                strafe_frequency: 0.7,
            },
            Archetype::Mage => Self {
                preferred_range: 300.0,
                retreat_range: 200.0,
                aggression_bonus: 0.0,
                ability_usage: 0.9,
                movement_speed: 0.9,
                strafe_frequency: 0.5,
            },
        }
    }
}

/// Read-only view of the world for one decision
pub struct BotContext<'a> {
    pub me: &'a Champion,
    pub opponent: Option<&'a Champion>,
    pub arena: &'a Arena,
    pub projectiles: &'a [Projectile],
    pub now: Millis,
    /// Tick length in seconds
    pub dt: f32,
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    /// Champion this engine drives
    pub id: EntityId,
    pub state: BotState,
    pub pattern: BehaviorPattern,
    pub difficulty: Difficulty,
    /// Current movement goal
    pub target: Option<Vec2>,
    /// 0-1; rises when hurt
    pub aggression: f32,
    rng: Pcg32,
    last_action_at: Option<Millis>,
    last_decision_at: Option<Millis>,
    last_ability_at: Option<Millis>,
    last_damage_at: Option<Millis>,
    last_opponent: Option<Vec2>,
    predicted_opponent: Option<Vec2>,
    retreat_point: Option<Vec2>,
    strafe_sign: f32,
    strafe_changed_at: Millis,
    strafe_interval_ms: Millis,
    /// Unit steering direction held between action ticks
    heading: Vec2,
}

impl DecisionEngine {
    pub fn new(id: EntityId, archetype: Archetype, difficulty: Difficulty, rng: Pcg32) -> Self {
        let pattern = BehaviorPattern::for_archetype(archetype);
        let mut engine = Self {
            id,
            state: BotState::Idle,
            pattern,
            difficulty,
            target: None,
            aggression: 0.0,
            rng,
            last_action_at: None,
            last_decision_at: None,
            last_ability_at: None,
            last_damage_at: None,
            last_opponent: None,
            predicted_opponent: None,
            retreat_point: None,
            strafe_sign: 1.0,
            strafe_changed_at: 0,
            strafe_interval_ms: 1000,
            heading: Vec2::ZERO,
        };
        engine.reset();
        engine
    }

    fn base_aggression(&self) -> f32 {
        (self.difficulty.aggression() + self.pattern.aggression_bonus).min(1.0)
    }

    /// Forget everything about the previous round
    pub fn reset(&mut self) {
        self.state = BotState::Idle;
        self.target = None;
        self.aggression = self.base_aggression();
        self.last_action_at = None;
        self.last_decision_at = None;
        self.last_ability_at = None;
        self.last_damage_at = None;
        self.last_opponent = None;
        self.predicted_opponent = None;
        self.retreat_point = None;
        self.strafe_sign = 1.0;
        self.strafe_changed_at = 0;
        self.heading = Vec2::ZERO;
    }

    /// Notify the engine that its champion was hurt
    pub fn on_damage(&mut self, now: Millis, health_pct: f32) {
        self.last_damage_at = Some(now);
        self.aggression = (self.aggression + 0.1).min(1.0);
        if health_pct < RETREAT_HEALTH_PCT {
            self.state = BotState::Retreating;
        }
    }

    /// Where the engine expects the opponent to be shortly
    pub fn predicted_opponent(&self) -> Option<Vec2> {
        self.predicted_opponent
    }

    /// Produce this tick's intent
    pub fn update(&mut self, ctx: &BotContext) -> Intent {
        let Some(opponent) = ctx.opponent.filter(|o| o.alive) else {
            self.state = BotState::Idle;
            self.heading = Vec2::ZERO;
            return Intent::default();
        };
        if !ctx.me.alive {
            return Intent::default();
        }

        let action_due = self
            .last_action_at
            .is_none_or(|t| ctx.now.saturating_sub(t) >= self.difficulty.action_delay_ms());
        if !action_due {
            return self.hold_course(ctx);
        }
        self.last_action_at = Some(ctx.now);

        self.track_opponent(opponent.position);

        let decision_due = self
            .last_decision_at
            .is_none_or(|t| ctx.now.saturating_sub(t) > DECISION_INTERVAL_MS);
        if decision_due {
            self.decide(ctx, opponent);
            self.last_decision_at = Some(ctx.now);
        }

        self.execute(ctx, opponent)
    }

    fn track_opponent(&mut self, position: Vec2) {
        let velocity = self.last_opponent.map_or(Vec2::ZERO, |last| position - last);
        self.predicted_opponent = Some(position + velocity * LOOKAHEAD);
        self.last_opponent = Some(position);
    }

    fn decide(&mut self, ctx: &BotContext, opponent: &Champion) {
        let distance = ctx.me.position.distance(opponent.position);
        let hurt_recently = self
            .last_damage_at
            .is_some_and(|t| ctx.now.saturating_sub(t) < RECENT_DAMAGE_MS);

        if ctx.me.health_pct() < RETREAT_HEALTH_PCT || hurt_recently {
            self.state = BotState::Retreating;
            self.retreat_point = self.find_cover(ctx, opponent.position);
        } else if self.should_use_ability(ctx.now) {
            self.state = BotState::UsingAbility;
        } else if distance < self.pattern.preferred_range * 1.5
            && ctx.arena.has_line_of_sight(ctx.me.position, opponent.position)
        {
            self.state = BotState::Attacking;
        } else {
            self.state = BotState::Moving;
            self.target = Some(self.reposition(ctx, opponent.position, distance));
        }
    }

    fn ability_gap_elapsed(&self, now: Millis) -> bool {
        self.last_ability_at
            .is_none_or(|t| now.saturating_sub(t) >= self.difficulty.ability_gap_ms())
    }

    fn should_use_ability(&mut self, now: Millis) -> bool {
        if !self.ability_gap_elapsed(now) {
            return false;
        }
        let roll: f32 = self.rng.random();
        roll < self.pattern.ability_usage * self.aggression
    }

    /// Step toward or away from the opponent to reach preferred range
    fn reposition(&self, ctx: &BotContext, opponent: Vec2, distance: f32) -> Vec2 {
        let toward = direction(ctx.me.position, opponent);
        let step = if distance < self.pattern.preferred_range {
            -REPOSITION_STEP
        } else {
            REPOSITION_STEP
        };
        clamp_to_bounds(
            ctx.me.position + toward * step,
            ctx.arena.width,
            ctx.arena.height,
            BOUNDS_MARGIN,
        )
    }

    /// Nearest reachable hiding spot: a corner, or the far side of a live
    /// cover piece relative to the opponent
    fn find_cover(&self, ctx: &BotContext, opponent: Vec2) -> Option<Vec2> {
        let (w, h) = (ctx.arena.width, ctx.arena.height);
        let corners = [
            Vec2::new(CORNER_INSET, CORNER_INSET),
            Vec2::new(w - CORNER_INSET, CORNER_INSET),
            Vec2::new(CORNER_INSET, h - CORNER_INSET),
            Vec2::new(w - CORNER_INSET, h - CORNER_INSET),
        ];
        let behind_cover = ctx.arena.cover().iter().filter(|c| c.is_live()).map(|c| {
            let center = c.rect.center();
            let reach = c.rect.width.max(c.rect.height) / 2.0 + PLAYER_SIZE;
            clamp_to_bounds(center + direction(opponent, center) * reach, w, h, BOUNDS_MARGIN)
        });

        corners
            .into_iter()
            .chain(behind_cover)
            .filter(|&spot| ctx.arena.has_line_of_sight(ctx.me.position, spot))
            .min_by(|a, b| {
                a.distance_squared(ctx.me.position)
                    .total_cmp(&b.distance_squared(ctx.me.position))
            })
    }

    /// Straight away from the opponent, kept inside the arena
    fn direct_retreat(&self, ctx: &BotContext, opponent: Vec2) -> Vec2 {
        let away = direction(opponent, ctx.me.position);
        clamp_to_bounds(
            ctx.me.position + away * RETREAT_DISTANCE,
            ctx.arena.width,
            ctx.arena.height,
            BOUNDS_MARGIN,
        )
    }

    fn execute(&mut self, ctx: &BotContext, opponent: &Champion) -> Intent {
        match self.state {
            BotState::Idle => {
                self.heading = Vec2::ZERO;
                Intent::default()
            }
            BotState::Moving => {
                self.steer(ctx, opponent.position);
                self.hold_course(ctx)
            }
            BotState::Attacking => {
                self.heading = Vec2::ZERO;
                self.attack(ctx, opponent)
            }
            BotState::Retreating => {
                let goal = self
                    .retreat_point
                    .unwrap_or_else(|| self.direct_retreat(ctx, opponent.position));
                self.target = Some(goal);
                self.steer(ctx, opponent.position);
                self.hold_course(ctx)
            }
            BotState::UsingAbility => {
                self.heading = Vec2::ZERO;
                self.state = BotState::Attacking;
                let mut intent = Intent::default();
                if !self.ability_gap_elapsed(ctx.now) {
                    return intent;
                }
                let distance = ctx.me.position.distance(opponent.position);
                let los = ctx.arena.has_line_of_sight(ctx.me.position, opponent.position);
                if let Some(slot) = self.choose_ability(ctx.me, distance, los) {
                    let at = self.last_opponent.unwrap_or(opponent.position);
                    intent.ability = Some((slot, at));
                    intent.aim = Some(at);
                    self.last_ability_at = Some(ctx.now);
                    log::debug!(
                        "Bot {} uses {} at distance {:.0}",
                        self.id,
                        ctx.me.ability(slot).name(),
                        distance
                    );
                }
                intent
            }
        }
    }

    /// Archetype-specific ability pick; None when nothing fits
    fn choose_ability(&self, me: &Champion, distance: f32, los: bool) -> Option<AbilitySlot> {
        let q_ready = me.q.is_ready();
        let e_ready = me.e.is_ready();
        match me.archetype {
            Archetype::Vanguard => {
                if q_ready && distance > 150.0 && distance < 300.0 {
                    Some(AbilitySlot::Q)
                } else if e_ready && distance < 120.0 {
                    Some(AbilitySlot::E)
                } else {
                    None
                }
            }
            Archetype::Ranger => {
                if q_ready && distance > 200.0 && los {
                    Some(AbilitySlot::Q)
                } else if e_ready && distance < 150.0 {
                    Some(AbilitySlot::E)
                } else {
                    None
                }
            }
            Archetype::Mage => {
                if q_ready && distance > 250.0 && los {
                    Some(AbilitySlot::Q)
                } else if e_ready && me.health_pct() < 0.5 {
                    Some(AbilitySlot::E)
                } else {
                    None
                }
            }
        }
    }

    fn attack(&mut self, ctx: &BotContext, opponent: &Champion) -> Intent {
        let aim_at = self.predicted_opponent.unwrap_or(opponent.position);
        let inaccuracy = (1.0 - self.aggression) * 0.2;
        let jitter = Vec2::new(self.jitter(), self.jitter()) * inaccuracy;
        let aim = (direction(ctx.me.position, aim_at) + jitter).normalize_or_zero();
        if aim == Vec2::ZERO {
            return Intent::default();
        }
        let target = ctx.me.position + aim * AIM_DISTANCE;
        Intent {
            movement: Movement::None,
            aim: Some(target),
            shoot: Some(target),
            ability: None,
        }
    }

    /// Centre-weighted noise in [-0.5, 0.5]
    fn jitter(&mut self) -> f32 {
        let a: f32 = self.rng.random();
        let b: f32 = self.rng.random();
        (a + b) / 2.0 - 0.5
    }

    /// Recompute the blended heading toward `self.target`
    fn steer(&mut self, ctx: &BotContext, opponent: Vec2) {
        let Some(target) = self.target else {
            self.heading = Vec2::ZERO;
            return;
        };
        let seek = direction(ctx.me.position, target);
        let strafe = self.strafe(ctx, opponent);
        let avoid = self.avoidance(ctx);
        self.heading = (seek * SEEK_WEIGHT + strafe * STRAFE_WEIGHT + avoid * AVOID_WEIGHT)
            .normalize_or_zero();
    }

    /// Perpendicular to the opponent direction; side flips at random intervals
    fn strafe(&mut self, ctx: &BotContext, opponent: Vec2) -> Vec2 {
        if ctx.now.saturating_sub(self.strafe_changed_at) > self.strafe_interval_ms {
            self.strafe_sign = -self.strafe_sign;
            self.strafe_changed_at = ctx.now;
            self.strafe_interval_ms = self.rng.random_range(1000..3000);
        }
        let to_opponent = direction(ctx.me.position, opponent);
        to_opponent.perp() * self.strafe_sign * self.pattern.strafe_frequency
    }

    /// Push away from hostile projectiles, weighted by proximity
    fn avoidance(&self, ctx: &BotContext) -> Vec2 {
        avoidance_vector(ctx.me, ctx.projectiles)
    }

    /// Movement along the held heading for this tick
    fn hold_course(&self, ctx: &BotContext) -> Intent {
        let moving = matches!(self.state, BotState::Moving | BotState::Retreating);
        if !moving || self.heading == Vec2::ZERO {
            return Intent::default();
        }
        let step = ctx.me.current_speed() * self.pattern.movement_speed * ctx.dt;
        Intent {
            movement: Movement::Displacement(self.heading * step),
            ..Intent::default()
        }
    }
}

/// Sum of unit vectors away from each hostile projectile within
/// `AVOIDANCE_RADIUS`, each scaled by `1 - d / AVOIDANCE_RADIUS`
pub fn avoidance_vector(me: &Champion, projectiles: &[Projectile]) -> Vec2 {
    projectiles
        .iter()
        .filter(|p| p.owner != me.id)
        .filter_map(|p| {
            let d = me.position.distance(p.position);
            (d < AVOIDANCE_RADIUS)
                .then(|| direction(p.position, me.position) * (1.0 - d / AVOIDANCE_RADIUS))
        })
        .sum()
}

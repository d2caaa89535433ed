//! Fixed timestep simulation tick
//!
//! Core game loop that advances a match deterministically. Champions act in
//! id order; projectiles and traps resolve in spawn order.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::arena::Impact;
use super::bot::BotContext;
use super::champion::{AbilityResult, AbilitySlot};
use super::collision::{knockback, within_radius};
use super::geometry::distance_to_segment;
use super::projectile::{AreaEffect, EffectKind, Projectile, Trap, VisualEffect};
use super::state::{GameEvent, MatchPhase, MatchState};
use crate::consts::*;
use crate::{Millis, angle_to};

/// How a champion wants to move this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Movement {
    #[default]
    None,
    /// Move along a direction at the champion's effective speed
    Direction(Vec2),
    /// Move by an exact offset (already scaled by speed and time)
    Displacement(Vec2),
}

/// One champion's commands for a single tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub movement: Movement,
    /// Point to face
    pub aim: Option<Vec2>,
    /// Fire the weapon at this point
    pub shoot: Option<Vec2>,
    pub ability: Option<(AbilitySlot, Vec2)>,
}

impl Intent {
    pub fn is_idle(&self) -> bool {
        *self == Intent::default()
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Intents for human-controlled champions. Bot-driven champions ignore
    /// anything listed here.
    pub intents: BTreeMap<EntityId, Intent>,
}

impl TickInput {
    pub fn with(mut self, id: EntityId, intent: Intent) -> Self {
        self.intents.insert(id, intent);
        self
    }
}

/// Advance the match by `dt_ms` milliseconds
pub fn tick(state: &mut MatchState, input: &TickInput, dt_ms: Millis) {
    if state.is_over() {
        return;
    }
    state.now += dt_ms;
    let now = state.now;
    let dt = dt_ms as f32 / 1000.0;

    // Cosmetics keep animating between rounds
    state.effects.retain_mut(|fx| fx.advance(dt));

    match state.phase {
        MatchPhase::Countdown { until } => {
            if now < until {
                return;
            }
            state.phase = MatchPhase::Active;
            log::info!("Round {} live", state.round);
        }
        MatchPhase::RoundOver { until, .. } => {
            if now >= until {
                state.start_next_round();
            }
            return;
        }
        MatchPhase::MatchOver { .. } => return,
        MatchPhase::Active => {}
    }

    let first_event = state.events().len();

    for champion in &mut state.champions {
        champion.update(now, dt_ms);
    }

    for (id, intent) in gather_intents(state, input, dt) {
        apply_intent(state, id, &intent, dt);
    }

    update_projectiles(state, dt);
    update_traps(state);
    notify_bots(state, first_event);

    state.check_round_end();
}

/// Bot intents for bot-driven champions, input intents for the rest
fn gather_intents(state: &mut MatchState, input: &TickInput, dt: f32) -> Vec<(EntityId, Intent)> {
    let mut intents = Vec::with_capacity(state.champions.len());
    for champion in &state.champions {
        let intent = match state.bots.iter_mut().find(|b| b.id == champion.id) {
            Some(bot) => bot.update(&BotContext {
                me: champion,
                opponent: state.champions.iter().find(|c| c.id != champion.id),
                arena: &state.arena,
                projectiles: &state.projectiles,
                now: state.now,
                dt,
            }),
            None => input.intents.get(&champion.id).cloned().unwrap_or_default(),
        };
        if !intent.is_idle() {
            intents.push((champion.id, intent));
        }
    }
    intents
}

fn apply_intent(state: &mut MatchState, id: EntityId, intent: &Intent, dt: f32) {
    let Some(idx) = state.champions.iter().position(|c| c.id == id) else {
        return;
    };
    if !state.champions[idx].alive {
        return;
    }
    let now = state.now;

    let step = {
        let champion = &state.champions[idx];
        match intent.movement {
            Movement::None => None,
            Movement::Direction(dir) => champion.movement_step(dir, dt),
            Movement::Displacement(offset) => (!champion.is_rooted()).then_some(offset),
        }
    };
    if let Some(step) = step.filter(|s| *s != Vec2::ZERO) {
        let wanted = state.champions[idx].position + step;
        state.champions[idx].position = state.arena.resolve_player_move(wanted, PLAYER_SIZE);
    }

    if let Some(aim) = intent.aim {
        let champion = &mut state.champions[idx];
        champion.rotation = angle_to(champion.position, aim);
    }

    if let Some(target) = intent.shoot
        && let Some(shots) = state.champions[idx].shoot(target, now)
    {
        let pellets = shots.len();
        let empowered = shots.iter().any(|s| s.aoe.is_some());
        for spec in shots {
            let pid = state.next_entity_id();
            state.projectiles.push(Projectile::from_spec(pid, id, spec));
        }
        state.push_event(GameEvent::ShotFired {
            owner: id,
            pellets,
            empowered,
        });
    }

    if let Some((slot, target)) = intent.ability
        && let Some(result) = state.champions[idx].use_ability(slot, target, now)
    {
        log::debug!(
            "Champion {} used {}",
            id,
            state.champions[idx].ability(slot).name()
        );
        state.push_event(GameEvent::AbilityUsed {
            owner: id,
            slot,
            target,
        });
        apply_ability(state, idx, result);
    }
}

pub(crate) fn apply_ability(state: &mut MatchState, idx: usize, result: AbilityResult) {
    let id = state.champions[idx].id;
    let now = state.now;

    match result {
        AbilityResult::Charge {
            start,
            end,
            damage,
            knockback: distance,
        } => {
            let end = state.arena.resolve_player_move(end, PLAYER_SIZE);
            state.champions[idx].position = end;
            state
                .effects
                .push(VisualEffect::new(EffectKind::Charge, start, Some(end), 0.0));

            for j in enemies_of(state, id) {
                let position = state.champions[j].position;
                if distance_to_segment(position, start, end) > PLAYER_SIZE {
                    continue;
                }
                damage_champion(state, j, damage, Some(id));
                if state.champions[j].alive {
                    let pushed = knockback(position, start, distance);
                    state.champions[j].position =
                        state.arena.resolve_player_move(pushed, PLAYER_SIZE);
                }
            }
        }
        AbilityResult::GroundSlam {
            center,
            radius,
            damage,
            slow_ms,
            slow_multiplier,
        } => {
            state
                .effects
                .push(VisualEffect::new(EffectKind::GroundSlam, center, None, radius));
            for j in enemies_of(state, id) {
                if !within_radius(state.champions[j].position, center, radius) {
                    continue;
                }
                damage_champion(state, j, damage, Some(id));
                if state.champions[j].alive {
                    state.champions[j].apply_slow(slow_ms, slow_multiplier, now);
                }
            }
        }
        AbilityResult::PiercingShot(spec) | AbilityResult::Fireball(spec) => {
            let pid = state.next_entity_id();
            state.projectiles.push(Projectile::from_spec(pid, id, spec));
        }
        AbilityResult::ScoutTrap {
            position,
            radius,
            root_ms,
            reveal_ms,
        } => {
            let trap_id = state.next_entity_id();
            state.traps.push(Trap {
                id: trap_id,
                owner: id,
                position,
                radius,
                root_ms,
                reveal_ms,
                placed_at: now,
                activated: false,
            });
        }
        AbilityResult::Teleport { start, end } => {
            let end = state.arena.resolve_player_move(end, PLAYER_SIZE);
            state.champions[idx].position = end;
            state
                .effects
                .push(VisualEffect::new(EffectKind::Teleport, start, Some(end), 0.0));
        }
    }
}

/// Indices of living champions other than `id`
fn enemies_of(state: &MatchState, id: EntityId) -> Vec<usize> {
    state
        .champions
        .iter()
        .enumerate()
        .filter(|(_, c)| c.alive && c.id != id)
        .map(|(j, _)| j)
        .collect()
}

/// Damage the champion at `idx`, recording the hit; returns health lost
pub(crate) fn damage_champion(
    state: &mut MatchState,
    idx: usize,
    amount: f32,
    source: Option<EntityId>,
) -> f32 {
    let now = state.now;
    let champion = &mut state.champions[idx];
    if !champion.alive {
        return 0.0;
    }
    let lost = champion.take_damage(amount, now);
    let (target, position, died) = (champion.id, champion.position, !champion.alive);

    state
        .effects
        .push(VisualEffect::new(EffectKind::Damage, position, None, lost));
    state.push_event(GameEvent::Damage {
        target,
        source,
        amount: lost,
    });
    if died {
        log::info!("Champion {} down", target);
        state.push_event(GameEvent::Death { id: target });
    }
    lost
}

/// Splash damage around `center`, sparing the owner and `exclude`
fn detonate(
    state: &mut MatchState,
    center: Vec2,
    aoe: AreaEffect,
    owner: EntityId,
    exclude: Option<EntityId>,
) {
    state
        .effects
        .push(VisualEffect::new(EffectKind::Explosion, center, None, aoe.radius));
    for j in enemies_of(state, owner) {
        let champion = &state.champions[j];
        if Some(champion.id) == exclude || !within_radius(champion.position, center, aoe.radius) {
            continue;
        }
        damage_champion(state, j, aoe.damage, Some(owner));
    }
}

fn update_projectiles(state: &mut MatchState, dt: f32) {
    let mut projectiles = std::mem::take(&mut state.projectiles);
    projectiles.retain_mut(|p| step_projectile(state, p, dt));
    state.projectiles = projectiles;
}

/// Advance one projectile and resolve its hits; false once it is spent
fn step_projectile(state: &mut MatchState, p: &mut Projectile, dt: f32) -> bool {
    if !p.advance(dt) {
        return false;
    }

    if let Some(impact) = state.arena.check_projectile_impact(p.position, p.damage) {
        if let Impact::Cover {
            index,
            destroyed: true,
        } = impact
        {
            let rect = state.arena.cover()[index].rect;
            state.effects.push(VisualEffect::new(
                EffectKind::Explosion,
                rect.center(),
                None,
                rect.width,
            ));
            state.push_event(GameEvent::CoverDestroyed { index });
        }
        if let Some(aoe) = p.aoe {
            detonate(state, p.position, aoe, p.owner, None);
        }
        return false;
    }

    for j in 0..state.champions.len() {
        let champion = &state.champions[j];
        if !champion.alive
            || !p.can_hit(champion.id)
            || !within_radius(p.position, champion.position, PLAYER_SIZE)
        {
            continue;
        }
        let target = champion.id;
        damage_champion(state, j, p.damage, Some(p.owner));
        if p.piercing {
            p.hit.push(target);
            continue;
        }
        if let Some(aoe) = p.aoe {
            detonate(state, p.position, aoe, p.owner, Some(target));
        }
        return false;
    }
    true
}

fn update_traps(state: &mut MatchState) {
    let now = state.now;
    for t in 0..state.traps.len() {
        let trap = &state.traps[t];
        let Some(target) = state
            .champions
            .iter()
            .find(|c| c.alive && trap.triggers_on(now, c.id, c.position))
            .map(|c| c.id)
        else {
            continue;
        };

        let trap = &mut state.traps[t];
        trap.activated = true;
        let (trap_id, position, root_ms, reveal_ms) =
            (trap.id, trap.position, trap.root_ms, trap.reveal_ms);

        if let Some(champion) = state.champion_mut(target) {
            champion.apply_root(root_ms, now);
        }
        state.effects.push(VisualEffect::new(
            EffectKind::TrapActivation,
            position,
            None,
            0.0,
        ));
        state.push_event(GameEvent::TrapTriggered {
            trap: trap_id,
            target,
            reveal_ms,
        });
        log::debug!("Trap {} rooted champion {}", trap_id, target);
    }
    state.traps.retain(|t| !t.is_expired(now));
}

/// Tell each bot whether its champion was hit this tick
fn notify_bots(state: &mut MatchState, first_event: usize) {
    let hurt: Vec<EntityId> = state.events()[first_event..]
        .iter()
        .filter_map(|e| match e {
            GameEvent::Damage { target, .. } => Some(*target),
            _ => None,
        })
        .collect();
    if hurt.is_empty() {
        return;
    }
    let now = state.now;
    for bot in &mut state.bots {
        if !hurt.contains(&bot.id) {
            continue;
        }
        if let Some(champion) = state.champions.iter().find(|c| c.id == bot.id) {
            bot.on_damage(now, champion.health_pct());
        }
    }
}

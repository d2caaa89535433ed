//! Client-side prediction and server reconciliation
//!
//! The local champion moves immediately. Every sync the reconciler records
//! where it was, tagged with a sequence number. When an authoritative entry
//! for the local champion arrives:
//!
//! ```text
//! Log:      [1] [2] [3] [4]      (position + movement after each)
//!                │
//! Server:   [S @ t2]
//!                │
//! Reconcile: compare the current prediction with S; if off by more
//!            than the threshold, snap to S and replay movement of [2,3,4]
//! ```
//!
//! Remote champions are never predicted; they ease toward the reported
//! position by a factor of the packet's age.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::snapshot::PlayerSnapshot;
use crate::Millis;
use crate::consts::PLAYER_SIZE;
use crate::settings::NetSettings;
use crate::sim::{Arena, Champion, EntityId};

/// Records older than this many lag windows are pruned
pub const INPUT_MAX_AGE_FACTOR: Millis = 10;

/// One entry in the local input log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub sequence: u32,
    pub timestamp: Millis,
    /// Predicted position when recorded
    pub position: Vec2,
    pub rotation: f32,
    /// Movement made between this record and the next
    pub movement_after: Vec2,
}

/// Outcome of reconciling the local champion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconciliation {
    /// Prediction within threshold; position untouched
    InSync { error: f32 },
    /// Snapped to the server and replayed `replayed` records
    Snapped { error: f32, replayed: usize },
    /// Diverged, but no logged input matches the snapshot time; position untouched
    Unmatched { error: f32 },
}

impl Reconciliation {
    pub fn error(&self) -> f32 {
        match *self {
            Reconciliation::InSync { error }
            | Reconciliation::Snapped { error, .. }
            | Reconciliation::Unmatched { error } => error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    local_id: EntityId,
    settings: NetSettings,
    log: VecDeque<InputRecord>,
    next_sequence: u32,
}

impl Reconciler {
    pub fn new(local_id: EntityId, settings: NetSettings) -> Self {
        let capacity = settings.input_log_capacity;
        Self {
            local_id,
            settings,
            log: VecDeque::with_capacity(capacity),
            next_sequence: 1,
        }
    }

    pub fn local_id(&self) -> EntityId {
        self.local_id
    }

    pub fn settings(&self) -> &NetSettings {
        &self.settings
    }

    /// Change the lag window (network quality adaptation)
    pub fn set_lag_compensation(&mut self, lag_ms: Millis) {
        self.settings.lag_compensation_ms = lag_ms;
    }

    pub fn log(&self) -> impl Iterator<Item = &InputRecord> {
        self.log.iter()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Append the local champion's current state and return its sequence
    pub fn record(&mut self, champion: &Champion, now: Millis) -> u32 {
        if let Some(last) = self.log.back_mut() {
            last.movement_after = champion.position - last.position;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.log.push_back(InputRecord {
            sequence,
            timestamp: now,
            position: champion.position,
            rotation: champion.rotation,
            movement_after: Vec2::ZERO,
        });
        while self.log.len() > self.settings.input_log_capacity {
            self.log.pop_front();
        }
        sequence
    }

    /// Drop records older than `INPUT_MAX_AGE_FACTOR` lag windows
    pub fn prune(&mut self, now: Millis) {
        let max_age = self.settings.lag_compensation_ms * INPUT_MAX_AGE_FACTOR;
        self.log.retain(|r| now.saturating_sub(r.timestamp) <= max_age);
    }

    /// Forget every record (round reset)
    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// First record whose timestamp is within tolerance of `timestamp`
    pub fn matching(&self, timestamp: Millis) -> Option<&InputRecord> {
        self.log
            .iter()
            .find(|r| r.timestamp.abs_diff(timestamp) < self.settings.timestamp_tolerance_ms)
    }

    /// Correct the local champion against an authoritative entry.
    ///
    /// Divergence is the distance between the current predicted position and
    /// the server position. Past the threshold, and only when a logged input
    /// matches the server timestamp, the champion snaps to the server position
    /// and replays the movement of every record from the match onward. Health
    /// is always taken from the server.
    pub fn reconcile_local(
        &mut self,
        champion: &mut Champion,
        arena: &Arena,
        server: &PlayerSnapshot,
    ) -> Reconciliation {
        if let Some(last) = self.log.back_mut() {
            last.movement_after = champion.position - last.position;
        }
        let error = champion.position.distance(server.position);

        let result = if error <= self.settings.reconcile_threshold {
            Reconciliation::InSync { error }
        } else if let Some(sequence) = self.matching(server.timestamp).map(|r| r.sequence) {
            let mut position = server.position;
            let mut replayed = 0;
            for record in self.log.iter_mut().filter(|r| r.sequence >= sequence) {
                record.position = position;
                position =
                    arena.resolve_player_move(position + record.movement_after, PLAYER_SIZE);
                replayed += 1;
            }
            champion.position = position;
            log::debug!(
                "Reconciled champion {}: off by {:.1}, replayed {} inputs",
                champion.id,
                error,
                replayed
            );
            Reconciliation::Snapped { error, replayed }
        } else {
            log::debug!(
                "Champion {} off by {:.1} but no input matches t={}",
                champion.id,
                error,
                server.timestamp
            );
            Reconciliation::Unmatched { error }
        };

        overwrite_health(champion, server);
        result
    }
}

/// Server health is authoritative and never predicted
pub fn overwrite_health(champion: &mut Champion, server: &PlayerSnapshot) {
    champion.health = server.health.clamp(0.0, champion.max_health);
    champion.alive = server.alive && champion.health > 0.0;
}

/// Ease a remote champion toward its reported state.
///
/// Position moves by `min(age / lag, 1)` of the gap; with interpolation off
/// it snaps. Rotation, health and effects are copied as reported.
pub fn interpolate_remote(
    champion: &mut Champion,
    server: &PlayerSnapshot,
    age_ms: Millis,
    lag_ms: Millis,
    interpolate: bool,
) {
    champion.position = if interpolate && lag_ms > 0 {
        let factor = (age_ms as f32 / lag_ms as f32).min(1.0);
        champion.position.lerp(server.position, factor)
    } else {
        server.position
    };
    champion.rotation = server.rotation;
    champion.effects = server.effects;
    overwrite_health(champion, server);
}

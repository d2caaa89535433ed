//! Netcode: client prediction and server reconciliation
//!
//! `NetSession` piggybacks on the simulation tick. Each call to `sync`
//! publishes the local champion at the sync cadence, drains the inbox
//! oldest-first and folds every fresh packet into the match:
//!
//! ```text
//! tick ──► sync ──► record + publish (every sync_interval_ms)
//!            │
//!            └────► drain inbox ──► State  → reconcile local / ease remotes
//!                                  Action → dead-reckon projectiles, apply
//! ```

pub mod inbox;
pub mod quality;
pub mod reconcile;
pub mod snapshot;
pub mod transport;

pub use inbox::{Envelope, Inbox, InboxHandle, Packet, Received, RemoteAction, packet_age};
pub use quality::{NetModes, NetworkQuality, NetworkStats};
pub use reconcile::{InputRecord, Reconciler, Reconciliation, interpolate_remote, overwrite_health};
pub use snapshot::{PlayerSnapshot, ProjectileSnapshot, RoomSnapshot};
pub use transport::{MemoryTransport, Outbound, Transport};

use crate::Millis;
use crate::error::NetError;
use crate::settings::NetSettings;
use crate::sim::tick::{apply_ability, damage_champion};
use crate::sim::{AbilityResult, EntityId, GameEvent, MatchState, Projectile};

/// What one `sync` call did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// The local champion was published this call
    pub published: bool,
    /// Packets applied after the stale filter
    pub applied: usize,
    /// Outcome of the last local reconciliation, if any arrived
    pub reconciliation: Option<Reconciliation>,
}

/// One client's view of a networked match
pub struct NetSession<T: Transport> {
    room_id: String,
    reconciler: Reconciler,
    inbox: Inbox,
    transport: T,
    quality: NetworkQuality,
    modes: NetModes,
    last_sync_at: Option<Millis>,
    round: u32,
}

impl<T: Transport> NetSession<T> {
    pub fn new(
        room_id: impl Into<String>,
        local_id: EntityId,
        settings: NetSettings,
        transport: T,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            reconciler: Reconciler::new(local_id, settings),
            inbox: Inbox::new(),
            transport,
            quality: NetworkQuality::Good,
            modes: NetModes::default(),
            last_sync_at: None,
            round: 1,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn local_id(&self) -> EntityId {
        self.reconciler.local_id()
    }

    /// Producer end for the transport's receive callback
    pub fn inbox_handle(&self) -> InboxHandle {
        self.inbox.handle()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn quality(&self) -> NetworkQuality {
        self.quality
    }

    pub fn modes(&self) -> NetModes {
        self.modes
    }

    /// Re-tier the link and adapt the lag window and modes to it
    pub fn apply_quality(&mut self, stats: NetworkStats) -> NetworkQuality {
        let quality = NetworkQuality::from_stats(stats);
        if quality != self.quality {
            log::info!(
                "Network quality {} -> {} (ping {} ms, loss {:.1}%)",
                self.quality.as_str(),
                quality.as_str(),
                stats.ping_ms,
                stats.packet_loss * 100.0
            );
        }
        self.quality = quality;
        self.modes = quality.modes();
        self.reconciler.set_lag_compensation(quality.lag_compensation_ms());
        quality
    }

    /// Publish a discrete action (shot, ability, damage) right away
    pub fn send_action(&mut self, now: Millis, action: RemoteAction) -> Result<(), NetError> {
        self.transport.publish(&Outbound::Action {
            room_id: self.room_id.clone(),
            sent_at: now,
            action,
        })
    }

    /// Whether the next `sync` at `now` publishes the local champion
    pub fn is_due(&self, now: Millis) -> bool {
        let interval = self.reconciler.settings().sync_interval_ms;
        self.last_sync_at.is_none_or(|last| now.saturating_sub(last) >= interval)
    }

    /// Exchange state with the room. Call once per simulation tick.
    pub fn sync(&mut self, state: &mut MatchState) -> SyncReport {
        let now = state.now;
        let mut report = SyncReport::default();

        if state.round != self.round {
            self.round = state.round;
            self.reconciler.clear();
            log::debug!("Round {}: input log cleared", state.round);
        }

        if self.is_due(now) {
            self.last_sync_at = Some(now);
            report.published = self.publish_local(state);
        }

        let limit = self.reconciler.settings().stale_after_ms();
        for received in self.inbox.drain(now, limit) {
            match received.packet {
                Packet::State(snapshot) => {
                    if let Some(result) = self.apply_snapshot(state, &snapshot, received.age_ms) {
                        report.reconciliation = Some(result);
                    }
                }
                Packet::Action(action) => self.apply_action(state, action, received.age_ms),
            }
            report.applied += 1;
        }

        self.reconciler.prune(now);
        report
    }

    fn publish_local(&mut self, state: &MatchState) -> bool {
        let Some(champion) = state.champion(self.local_id()) else {
            return false;
        };
        let sequence = if self.modes.prediction {
            self.reconciler.record(champion, state.now)
        } else {
            0
        };
        let message = Outbound::PlayerState {
            room_id: self.room_id.clone(),
            sequence,
            sent_at: state.now,
            player: PlayerSnapshot::capture(champion, state.now),
        };
        match self.transport.publish(&message) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Publish to room {} failed: {}", self.room_id, err);
                false
            }
        }
    }

    /// Fold an authoritative room document into the match
    fn apply_snapshot(
        &mut self,
        state: &mut MatchState,
        snapshot: &RoomSnapshot,
        age_ms: Millis,
    ) -> Option<Reconciliation> {
        if snapshot.round != state.round {
            log::debug!(
                "Ignoring snapshot from round {} during round {}",
                snapshot.round,
                state.round
            );
            return None;
        }
        let local_id = self.local_id();
        let lag_ms = self.reconciler.settings().lag_compensation_ms;
        let mut result = None;

        for server in &snapshot.players {
            let arena = &state.arena;
            let Some(champion) = state.champions.iter_mut().find(|c| c.id == server.id) else {
                continue;
            };
            if server.id != local_id {
                interpolate_remote(champion, server, age_ms, lag_ms, self.modes.interpolation);
            } else if self.modes.reconciliation {
                result = Some(self.reconciler.reconcile_local(champion, arena, server));
            } else {
                overwrite_health(champion, server);
            }
        }

        state.projectiles.retain(|p| p.owner == local_id);
        state.projectiles.extend(
            snapshot
                .projectiles
                .iter()
                .filter(|p| p.owner != local_id)
                .map(|p| p.to_projectile(age_ms)),
        );
        state.arena.sync_cover_health(&snapshot.cover_health);
        result
    }

    fn apply_action(&mut self, state: &mut MatchState, action: RemoteAction, age_ms: Millis) {
        let now = state.now;
        match action {
            RemoteAction::Shoot { player, target } => {
                if player == self.local_id() {
                    return;
                }
                let Some(idx) = state.champions.iter().position(|c| c.id == player) else {
                    return;
                };
                let Some(shots) = state.champions[idx].shoot(target, now) else {
                    log::debug!("Remote shot from {} ignored: weapon not ready", player);
                    return;
                };
                let pellets = shots.len();
                let empowered = shots.iter().any(|s| s.aoe.is_some());
                for spec in shots {
                    let pid = state.next_entity_id();
                    let mut projectile = Projectile::from_spec(pid, player, spec);
                    projectile.fast_forward(age_ms);
                    state.projectiles.push(projectile);
                }
                state.push_event(GameEvent::ShotFired {
                    owner: player,
                    pellets,
                    empowered,
                });
            }
            RemoteAction::Ability { player, slot, target } => {
                if player == self.local_id() {
                    return;
                }
                let Some(idx) = state.champions.iter().position(|c| c.id == player) else {
                    return;
                };
                let Some(result) = state.champions[idx].use_ability(slot, target, now) else {
                    log::debug!("Remote {} from {} ignored: on cooldown", slot.as_str(), player);
                    return;
                };
                state.push_event(GameEvent::AbilityUsed {
                    owner: player,
                    slot,
                    target,
                });
                match result {
                    AbilityResult::PiercingShot(spec) | AbilityResult::Fireball(spec) => {
                        let pid = state.next_entity_id();
                        let mut projectile = Projectile::from_spec(pid, player, spec);
                        projectile.fast_forward(age_ms);
                        state.projectiles.push(projectile);
                    }
                    other => apply_ability(state, idx, other),
                }
            }
            RemoteAction::Damage { target, amount } => {
                if let Some(idx) = state.champions.iter().position(|c| c.id == target) {
                    damage_champion(state, idx, amount, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MatchSettings;
    use crate::sim::Archetype;
    use glam::Vec2;

    fn setup() -> (MatchState, NetSession<MemoryTransport>) {
        let state = MatchState::new(
            MatchSettings::default(),
            [Archetype::Vanguard, Archetype::Ranger],
        );
        let session = NetSession::new("room-1", 1, NetSettings::default(), MemoryTransport::new());
        (state, session)
    }

    #[test]
    fn test_publishes_at_sync_cadence() {
        let (mut state, mut session) = setup();
        for now in [0, 20, 40, 60, 80, 100] {
            state.now = now;
            session.sync(&mut state);
        }
        // 0, 60 (first at or past 50 ms after 0)
        let sequences: Vec<u32> = session
            .transport()
            .messages()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                Outbound::PlayerState { sequence, .. } => Some(*sequence),
                Outbound::Action { .. } => None,
            })
            .collect();
        assert_eq!(sequences, vec![1, 2]);
        assert_eq!(session.reconciler().len(), 2);
    }

    #[test]
    fn test_transport_failure_keeps_state() {
        let (mut state, _) = setup();
        let offline = MemoryTransport {
            offline: Some("no route".to_string()),
            ..MemoryTransport::default()
        };
        let mut session = NetSession::new("room-1", 1, NetSettings::default(), offline);
        let before = state.champions.clone();
        let report = session.sync(&mut state);
        assert!(!report.published);
        assert_eq!(state.champions[0].position, before[0].position);
        assert!(session.send_action(0, RemoteAction::Damage { target: 2, amount: 5.0 }).is_err());
    }

    #[test]
    fn test_remote_shot_is_dead_reckoned() {
        let (mut state, mut session) = setup();
        state.now = 1000;
        session
            .inbox_handle()
            .push(
                950,
                Packet::Action(RemoteAction::Shoot {
                    player: 2,
                    target: Vec2::new(100.0, 300.0),
                }),
            )
            .unwrap();
        let report = session.sync(&mut state);
        assert_eq!(report.applied, 1);
        assert_eq!(state.projectiles.len(), 1);
        let shot = &state.projectiles[0];
        assert_eq!(shot.owner, 2);
        // 50 ms at 400 u/s from (900, 300) toward the west
        assert!((shot.position.x - 880.0).abs() < 1e-3);
        assert!((shot.position.y - 300.0).abs() < 1e-3);
        assert!(state.events().iter().any(|e| matches!(e, GameEvent::ShotFired { owner: 2, .. })));
    }

    #[test]
    fn test_own_echo_is_ignored() {
        let (mut state, mut session) = setup();
        session
            .inbox_handle()
            .push(
                0,
                Packet::Action(RemoteAction::Shoot {
                    player: 1,
                    target: Vec2::new(500.0, 300.0),
                }),
            )
            .unwrap();
        session.sync(&mut state);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_remote_teleport_moves_champion() {
        let (mut state, _) = setup();
        state.champions[1] = crate::sim::Champion::new(2, Archetype::Mage, Vec2::new(900.0, 300.0));
        let mut session =
            NetSession::new("room-1", 1, NetSettings::default(), MemoryTransport::new());
        session
            .inbox_handle()
            .push(
                0,
                Packet::Action(RemoteAction::Ability {
                    player: 2,
                    slot: crate::sim::AbilitySlot::E,
                    target: Vec2::new(750.0, 300.0),
                }),
            )
            .unwrap();
        session.sync(&mut state);
        assert!(state.champions[1].position.distance(Vec2::new(750.0, 300.0)) < 1e-3);
        assert!(!state.champions[1].e.is_ready());
    }

    #[test]
    fn test_round_change_clears_input_log() {
        let (mut state, mut session) = setup();
        session.sync(&mut state);
        state.now = 50;
        session.sync(&mut state);
        assert_eq!(session.reconciler().len(), 2);

        state.round = 2;
        state.now = 100;
        session.sync(&mut state);
        let sequences: Vec<u32> = session.reconciler().log().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![3]);
    }

    #[test]
    fn test_stale_packets_are_not_applied() {
        let (mut state, mut session) = setup();
        state.now = 1000;
        let handle = session.inbox_handle();
        handle
            .push(500, Packet::Action(RemoteAction::Damage { target: 2, amount: 10.0 }))
            .unwrap();
        handle
            .push(950, Packet::Action(RemoteAction::Damage { target: 2, amount: 10.0 }))
            .unwrap();
        let report = session.sync(&mut state);
        assert_eq!(report.applied, 1);
        assert_eq!(state.champions[1].health, 70.0);
    }

    #[test]
    fn test_snapshot_reconciles_local_and_eases_remote() {
        let (mut state, mut session) = setup();
        state.now = 1000;
        session.sync(&mut state);

        let mut snapshot = RoomSnapshot::capture(&state);
        snapshot.players[0].position = Vec2::new(150.0, 300.0);
        snapshot.players[0].health = 100.0;
        snapshot.players[1].position = Vec2::new(800.0, 300.0);
        let mut other_round = snapshot.clone();
        other_round.round = 2;
        other_round.players[0].health = 1.0;

        let handle = session.inbox_handle();
        handle.push(1000, Packet::State(snapshot)).unwrap();
        handle.push(1010, Packet::State(other_round)).unwrap();

        state.now = 1050;
        let report = session.sync(&mut state);
        assert!(matches!(report.reconciliation, Some(Reconciliation::Snapped { .. })));
        assert_eq!(state.champions[0].position, Vec2::new(150.0, 300.0));
        assert_eq!(state.champions[0].health, 100.0);
        // Half the lag window old: halfway to the report
        assert_eq!(state.champions[1].position, Vec2::new(850.0, 300.0));
    }

    #[test]
    fn test_poor_link_disables_smoothing() {
        let (mut state, mut session) = setup();
        let quality = session.apply_quality(NetworkStats {
            ping_ms: 350,
            packet_loss: 0.0,
        });
        assert_eq!(quality, NetworkQuality::Poor);
        assert_eq!(session.reconciler().settings().lag_compensation_ms, 300);

        session.sync(&mut state);
        assert!(session.reconciler().is_empty());

        let mut snapshot = RoomSnapshot::capture(&state);
        snapshot.players[0].position = Vec2::new(400.0, 300.0);
        snapshot.players[1].position = Vec2::new(800.0, 300.0);
        session.inbox_handle().push(0, Packet::State(snapshot)).unwrap();
        let report = session.sync(&mut state);
        assert_eq!(report.reconciliation, None);
        // Local position is left alone; remote snaps
        assert_eq!(state.champions[0].position, Vec2::new(100.0, 300.0));
        assert_eq!(state.champions[1].position, Vec2::new(800.0, 300.0));
    }
}

//! Inbound packet queue
//!
//! The transport callback pushes packets as they arrive; the simulation
//! tick drains them, sorts by send time and processes oldest-first. This is
//! the only point where network data meets simulation state.

use crossbeam_channel::{Receiver, Sender};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::snapshot::RoomSnapshot;
use crate::Millis;
use crate::error::NetError;
use crate::sim::{AbilitySlot, EntityId};

/// Discrete action relayed from another client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemoteAction {
    Shoot {
        player: EntityId,
        target: Vec2,
    },
    Ability {
        player: EntityId,
        slot: AbilitySlot,
        target: Vec2,
    },
    Damage {
        target: EntityId,
        amount: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Packet {
    State(RoomSnapshot),
    Action(RemoteAction),
}

/// A packet with its sender timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sent_at: Millis,
    pub packet: Packet,
}

/// A drained packet that passed the age gate
#[derive(Debug, Clone, PartialEq)]
pub struct Received {
    pub age_ms: Millis,
    pub packet: Packet,
}

/// Age of a packet sent at `sent_at`, or `Stale` once it exceeds `limit_ms`.
/// Packets stamped in the future count as fresh.
pub fn packet_age(sent_at: Millis, now: Millis, limit_ms: Millis) -> Result<Millis, NetError> {
    let age_ms = now.saturating_sub(sent_at);
    if age_ms > limit_ms {
        return Err(NetError::Stale { age_ms, limit_ms });
    }
    Ok(age_ms)
}

/// Producer side, handed to the transport
#[derive(Debug, Clone)]
pub struct InboxHandle {
    sender: Sender<Envelope>,
}

impl InboxHandle {
    pub fn push(&self, sent_at: Millis, packet: Packet) -> Result<(), NetError> {
        self.sender
            .send(Envelope { sent_at, packet })
            .map_err(|_| NetError::Transport("inbox closed".to_string()))
    }

    /// Decode a JSON envelope and enqueue it
    pub fn push_json(&self, json: &str) -> Result<(), NetError> {
        let envelope: Envelope = serde_json::from_str(json)?;
        self.push(envelope.sent_at, envelope.packet)
    }
}

/// Consumer side, owned by the net session
#[derive(Debug)]
pub struct Inbox {
    sender: Sender<Envelope>,
    receiver: Receiver<Envelope>,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    pub fn handle(&self) -> InboxHandle {
        InboxHandle {
            sender: self.sender.clone(),
        }
    }

    /// Packets waiting to be drained
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Take everything queued, oldest first. Packets older than `limit_ms`
    /// are dropped and logged.
    pub fn drain(&self, now: Millis, limit_ms: Millis) -> Vec<Received> {
        let mut envelopes: Vec<Envelope> = self.receiver.try_iter().collect();
        envelopes.sort_by_key(|e| e.sent_at);

        envelopes
            .into_iter()
            .filter_map(|e| match packet_age(e.sent_at, now, limit_ms) {
                Ok(age_ms) => Some(Received {
                    age_ms,
                    packet: e.packet,
                }),
                Err(err) => {
                    log::debug!("Dropping packet: {}", err);
                    None
                }
            })
            .collect()
    }

    /// Discard everything queued
    pub fn clear(&self) {
        for _ in self.receiver.try_iter() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn damage(amount: f32) -> Packet {
        Packet::Action(RemoteAction::Damage { target: 1, amount })
    }

    #[test]
    fn test_drain_sorts_by_send_time() {
        let inbox = Inbox::new();
        let handle = inbox.handle();
        handle.push(950, damage(3.0)).unwrap();
        handle.push(900, damage(1.0)).unwrap();
        handle.push(920, damage(2.0)).unwrap();

        let drained = inbox.drain(1000, 200);
        let ages: Vec<Millis> = drained.iter().map(|r| r.age_ms).collect();
        assert_eq!(ages, vec![100, 80, 50]);
        assert!(inbox.is_empty());
    }

    #[test]
    fn test_stale_packets_dropped() {
        let inbox = Inbox::new();
        let handle = inbox.handle();
        handle.push(700, damage(1.0)).unwrap();
        handle.push(800, damage(2.0)).unwrap();
        let drained = inbox.drain(1000, 200);
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].packet, damage(2.0));

        assert!(matches!(
            packet_age(100, 1000, 200),
            Err(NetError::Stale { age_ms: 900, limit_ms: 200 })
        ));
        assert_eq!(packet_age(1200, 1000, 200).unwrap(), 0);
    }

    #[test]
    fn test_push_from_another_thread() {
        let inbox = Inbox::new();
        let handle = inbox.handle();
        std::thread::spawn(move || {
            for i in 0..10 {
                handle.push(i, damage(i as f32)).unwrap();
            }
        })
        .join()
        .unwrap();
        assert_eq!(inbox.len(), 10);
        assert_eq!(inbox.drain(10, 200).len(), 10);
    }

    #[test]
    fn test_push_json() {
        let inbox = Inbox::new();
        let envelope = Envelope {
            sent_at: 40,
            packet: Packet::Action(RemoteAction::Shoot {
                player: 2,
                target: Vec2::new(10.0, 20.0),
            }),
        };
        inbox
            .handle()
            .push_json(&serde_json::to_string(&envelope).unwrap())
            .unwrap();
        assert!(matches!(
            inbox.handle().push_json("{oops"),
            Err(NetError::Codec(_))
        ));
        let drained = inbox.drain(50, 200);
        assert_eq!(drained[0].packet, envelope.packet);
    }
}

//! Outbound seam toward the room backend
//!
//! Publishing is fire-and-forget: the simulation never waits on it and a
//! failure only means the backend keeps its last known state.

use serde::{Deserialize, Serialize};

use super::inbox::RemoteAction;
use super::snapshot::PlayerSnapshot;
use crate::Millis;
use crate::error::NetError;

/// A message written to the room document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outbound {
    /// The local player's entry, tagged with its input-log sequence
    PlayerState {
        room_id: String,
        sequence: u32,
        sent_at: Millis,
        player: PlayerSnapshot,
    },
    Action {
        room_id: String,
        sent_at: Millis,
        action: RemoteAction,
    },
}

impl Outbound {
    pub fn sent_at(&self) -> Millis {
        match self {
            Outbound::PlayerState { sent_at, .. } | Outbound::Action { sent_at, .. } => *sent_at,
        }
    }
}

pub trait Transport {
    fn publish(&mut self, message: &Outbound) -> Result<(), NetError>;
}

/// Keeps every published message as JSON; can be told to fail
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub sent: Vec<String>,
    /// When set, every publish fails with this reason
    pub offline: Option<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode everything published so far
    pub fn messages(&self) -> Result<Vec<Outbound>, NetError> {
        self.sent
            .iter()
            .map(|json| Ok(serde_json::from_str(json)?))
            .collect()
    }
}

impl Transport for MemoryTransport {
    fn publish(&mut self, message: &Outbound) -> Result<(), NetError> {
        if let Some(reason) = &self.offline {
            return Err(NetError::Transport(reason.clone()));
        }
        self.sent.push(serde_json::to_string(message)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn shoot() -> Outbound {
        Outbound::Action {
            room_id: "room-1".to_string(),
            sent_at: 120,
            action: RemoteAction::Shoot {
                player: 1,
                target: Vec2::new(5.0, 5.0),
            },
        }
    }

    #[test]
    fn test_memory_transport_records_json() {
        let mut transport = MemoryTransport::new();
        transport.publish(&shoot()).unwrap();
        assert_eq!(transport.messages().unwrap(), vec![shoot()]);
        assert_eq!(shoot().sent_at(), 120);
    }

    #[test]
    fn test_offline_transport_fails() {
        let mut transport = MemoryTransport {
            offline: Some("backend unreachable".to_string()),
            ..MemoryTransport::default()
        };
        let err = transport.publish(&shoot()).unwrap_err();
        assert!(matches!(err, NetError::Transport(ref reason) if reason == "backend unreachable"));
        assert!(transport.sent.is_empty());
    }
}

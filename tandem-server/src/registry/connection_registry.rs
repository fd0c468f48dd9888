use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{ConnectionId, RoomId, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct Connection {
    outbox: mpsc::UnboundedSender<ServerMessage>,
    current_room: Option<RoomId>,
}

/// Live connections and the room each one currently sits in.
///
/// Lookups of unknown ids are not faults: a disconnect can always race a
/// leave or a relay, so callers treat a miss as a no-op.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<ConnectionId, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: ConnectionId, outbox: mpsc::UnboundedSender<ServerMessage>) {
        self.connections.insert(
            id,
            Connection {
                outbox,
                current_room: None,
            },
        );
    }

    /// Idempotent. Returns whether the id was present.
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        self.connections.remove(id).is_some()
    }

    pub fn exists(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn current_room(&self, id: &ConnectionId) -> Option<RoomId> {
        self.connections
            .get(id)
            .and_then(|conn| conn.current_room.clone())
    }

    pub(crate) fn set_current_room(&self, id: &ConnectionId, room: Option<RoomId>) -> bool {
        match self.connections.get_mut(id) {
            Some(mut conn) => {
                conn.current_room = room;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Push a message into a connection's outbox.
    pub fn send(&self, id: &ConnectionId, msg: ServerMessage) -> bool {
        let Some(conn) = self.connections.get(id) else {
            debug!("Dropping message for unknown connection {}", id);
            return false;
        };
        if conn.outbox.send(msg).is_err() {
            warn!("Outbox of connection {} is closed", id);
            return false;
        }
        true
    }
}

impl SignalingOutput for ConnectionRegistry {
    fn deliver(&self, target: ConnectionId, msg: ServerMessage) -> bool {
        self.send(&target, msg)
    }
}

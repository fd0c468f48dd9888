use crate::registry::ConnectionRegistry;
use crate::relay::MessageRelay;
use crate::rendezvous::RendezvousCoordinator;
use crate::room::RoomTable;
use crate::signaling::SignalingOutput;
use serde::Serialize;
use std::sync::Arc;
use tandem_core::{ClientMessage, ConnectionId, ServerMessage};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub connections: usize,
    pub rooms: usize,
}

/// Single ingress for everything a connection sends.
///
/// Each connection's messages are dispatched one at a time in arrival
/// order by its socket task, and its disconnect runs only after the last
/// dispatch returned. Dispatch never suspends, so aborting the socket task
/// cannot cut a committed mutation off from its notifications.
#[derive(Clone)]
pub struct SignalingService {
    registry: ConnectionRegistry,
    coordinator: RendezvousCoordinator,
    relay: MessageRelay,
}

impl SignalingService {
    pub fn new() -> Self {
        let registry = ConnectionRegistry::new();
        let output: Arc<dyn SignalingOutput> = Arc::new(registry.clone());
        Self::with_output(registry, output)
    }

    /// Build the service around a custom output, e.g. a recording one.
    pub fn with_output(registry: ConnectionRegistry, output: Arc<dyn SignalingOutput>) -> Self {
        let rooms = RoomTable::new(registry.clone());
        Self {
            coordinator: RendezvousCoordinator::new(rooms, output.clone()),
            relay: MessageRelay::new(output),
            registry,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn coordinator(&self) -> &RendezvousCoordinator {
        &self.coordinator
    }

    /// Register a fresh connection and greet it with its identity.
    pub fn connect(&self, outbox: mpsc::UnboundedSender<ServerMessage>) -> ConnectionId {
        let id = ConnectionId::new();
        self.registry.register(id, outbox);
        self.registry.send(
            &id,
            ServerMessage::Welcome {
                connection_id: id,
            },
        );
        id
    }

    pub fn dispatch(&self, conn: ConnectionId, msg: ClientMessage) {
        match msg {
            ClientMessage::JoinRoom { room_id } => {
                self.coordinator.join(room_id, conn);
            }
            ClientMessage::LeaveRoom { room_id } => {
                self.coordinator.leave(&room_id, &conn);
            }
            signal => {
                let Ok((kind, payload, target)) = signal.into_signal() else {
                    return;
                };
                if let Err(miss) = self.relay.relay(kind, payload, conn, target) {
                    debug!("Dropped {:?} from {}: {}", kind, conn, miss);
                }
            }
        }
    }

    pub fn disconnect(&self, conn: ConnectionId) {
        self.coordinator.disconnect(&conn);
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            connections: self.registry.len(),
            rooms: self.coordinator.rooms().room_count(),
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

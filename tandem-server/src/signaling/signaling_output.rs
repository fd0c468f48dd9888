use tandem_core::{ConnectionId, ServerMessage};

/// Outbound side of the signaling server: how the coordinator and the relay
/// reach a connection without knowing about sockets.
///
/// The coordinator delivers while it still holds the room entry, so per-room
/// notifications reach every outbox in commit order. Implementations must
/// only enqueue and never block on I/O.
pub trait SignalingOutput: Send + Sync {
    /// Push a message to one connection. Returns `false` when the target is
    /// not connected (anymore).
    fn deliver(&self, target: ConnectionId, msg: ServerMessage) -> bool;
}

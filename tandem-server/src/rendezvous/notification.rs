use tandem_core::{ConnectionId, ServerMessage};

/// A message produced by a committed room mutation, addressed to one
/// connection. Delivered while the room entry is still held.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub target: ConnectionId,
    pub message: ServerMessage,
}

impl Notification {
    pub fn new(target: ConnectionId, message: ServerMessage) -> Self {
        Self { target, message }
    }
}

use crate::negotiation::NegotiationState;
use crate::transport::RemoteTrackInfo;
use tandem_core::{ConnectionId, Role, RoomId};

/// What the session reports to its owner (typically a UI).
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// `join-room` was sent.
    Joined {
        room: RoomId,
        local_id: ConnectionId,
    },
    PeerIdentified {
        peer: ConnectionId,
        role: Role,
    },
    StateChanged(NegotiationState),
    RemoteTrack(RemoteTrackInfo),
    PeerLeft {
        peer: ConnectionId,
    },
    RoomFull,
    /// The session could not continue; cleanup follows.
    Failed(String),
    /// Cleanup finished. Always the last event.
    Ended,
}

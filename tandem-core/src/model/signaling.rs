use crate::model::connection::ConnectionId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Handshake message kinds the server forwards without interpreting.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

/// Participant -> server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    Offer {
        payload: Value,
        target_id: ConnectionId,
    },
    Answer {
        payload: Value,
        target_id: ConnectionId,
    },
    Candidate {
        payload: Value,
        target_id: ConnectionId,
    },
}

impl ClientMessage {
    pub fn signal(kind: SignalKind, payload: Value, target_id: ConnectionId) -> Self {
        match kind {
            SignalKind::Offer => Self::Offer { payload, target_id },
            SignalKind::Answer => Self::Answer { payload, target_id },
            SignalKind::Candidate => Self::Candidate { payload, target_id },
        }
    }

    /// Splits a relayable message into its parts. Room control messages
    /// return the message back unchanged.
    pub fn into_signal(self) -> Result<(SignalKind, Value, ConnectionId), Self> {
        match self {
            Self::Offer { payload, target_id } => Ok((SignalKind::Offer, payload, target_id)),
            Self::Answer { payload, target_id } => Ok((SignalKind::Answer, payload, target_id)),
            Self::Candidate { payload, target_id } => {
                Ok((SignalKind::Candidate, payload, target_id))
            }
            other => Err(other),
        }
    }
}

/// Server -> participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Welcome {
        connection_id: ConnectionId,
    },
    /// Sent to the incumbent when a second participant arrives.
    PeerJoined {
        peer_id: ConnectionId,
    },
    /// Sent to the joiner when the room already holds a participant.
    PeerAlreadyPresent {
        peer_id: ConnectionId,
    },
    PeerLeft {
        peer_id: ConnectionId,
    },
    RoomFull {
        room_id: RoomId,
    },
    Offer {
        payload: Value,
        sender_id: ConnectionId,
    },
    Answer {
        payload: Value,
        sender_id: ConnectionId,
    },
    Candidate {
        payload: Value,
        sender_id: ConnectionId,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn relayed(kind: SignalKind, payload: Value, sender_id: ConnectionId) -> Self {
        match kind {
            SignalKind::Offer => Self::Offer { payload, sender_id },
            SignalKind::Answer => Self::Answer { payload, sender_id },
            SignalKind::Candidate => Self::Candidate { payload, sender_id },
        }
    }
}

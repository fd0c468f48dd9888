mod connection;
mod description;
mod role;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use description::{IceCandidate, SdpType, SessionDescription};
pub use role::Role;
pub use room::RoomId;
pub use signaling::{ClientMessage, ServerMessage, SignalKind};

pub mod peer_transport;
pub mod transport_config;
pub mod transport_event;
pub mod webrtc_transport;

pub use peer_transport::{PeerTransport, PeerTransportFactory};
pub use transport_config::TransportConfig;
pub use transport_event::{RemoteTrackInfo, TrackKind, TransportEvent, TransportState};
pub use webrtc_transport::{WebRtcTransport, WebRtcTransportFactory};

//! Participant side of a two-party call.
//!
//! A [`SessionManager`] owns one room membership: it acquires local media,
//! runs the filter pipeline, drives a [`Negotiator`] from signaling and
//! transport events, and tears everything down in a fixed order when the
//! participant leaves or the connection is lost.

pub mod config;
pub mod error;
pub mod media;
pub mod negotiation;
pub mod session;
pub mod signaling;
pub mod transport;

pub use config::ClientConfig;
pub use error::{AcquisitionError, NegotiationError, SessionError};
pub use media::{
    FilterKind, FramePipeline, FrameSink, FrameTransform, MediaHandle, MediaSource, Passthrough,
    VideoFrame,
};
pub use negotiation::{Action, NegotiationState, Negotiator};
pub use session::{Collaborators, SessionEvent, SessionEvents, SessionHandle, SessionManager};
pub use signaling::{SignalingConnector, SignalingLink, WsConnector};
pub use transport::{
    PeerTransport, PeerTransportFactory, RemoteTrackInfo, TrackKind, TransportConfig,
    TransportEvent, TransportState, WebRtcTransport, WebRtcTransportFactory,
};

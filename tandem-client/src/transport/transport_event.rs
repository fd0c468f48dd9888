use tandem_core::IceCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl TransportState {
    /// The path to the counterpart is gone. `Closed` counts too: a
    /// transport closed under a live negotiation never comes back.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed | Self::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

/// Events a transport reports to the session that owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A local candidate was gathered and must reach the counterpart.
    LocalCandidate(IceCandidate),

    /// The counterpart's media arrived.
    RemoteTrack(RemoteTrackInfo),

    StateChanged(TransportState),
}

use crate::media::FrameSink;
use crate::transport::{TransportConfig, TransportEvent};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

/// The platform peer connection, one per negotiation attempt.
///
/// Candidate, track and state callbacks are delivered as [`TransportEvent`]s
/// on the channel the transport was created with.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Creates an offer and installs it as the local description.
    async fn create_local_offer(&self) -> Result<SessionDescription>;

    /// Creates an answer and installs it as the local description. Requires
    /// the remote offer to be set.
    async fn create_local_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Adds an outgoing video track and returns where to write its frames.
    async fn add_local_video(&self) -> Result<Arc<dyn FrameSink>>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait PeerTransportFactory: Send + Sync {
    async fn create(
        &self,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>>;
}

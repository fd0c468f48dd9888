use anyhow::Result;
use async_trait::async_trait;
use tandem_core::{ClientMessage, ConnectionId, ServerMessage};
use tokio::sync::mpsc;

/// An open signaling connection.
///
/// Dropping `outbound` releases the connection.
#[derive(Debug)]
pub struct SignalingLink {
    /// Identity the server assigned to this connection.
    pub local_id: ConnectionId,
    pub outbound: mpsc::UnboundedSender<ClientMessage>,
    pub inbound: mpsc::UnboundedReceiver<ServerMessage>,
}

#[async_trait]
pub trait SignalingConnector: Send + Sync {
    /// Opens a connection and waits for the server to announce our identity.
    async fn connect(&self, url: &str) -> Result<SignalingLink>;
}

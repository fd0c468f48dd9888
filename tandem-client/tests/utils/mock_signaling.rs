use anyhow::{Result, bail};
use async_trait::async_trait;
use std::time::Duration;
use tandem_client::{SignalingConnector, SignalingLink};
use tandem_core::{ClientMessage, ConnectionId, ServerMessage};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::utils::Journal;

pub const WAIT: Duration = Duration::from_secs(5);

/// The server's side of a mock signaling connection, driven by the test.
pub struct ServerEnd {
    pub local_id: ConnectionId,
    from_client: mpsc::UnboundedReceiver<ClientMessage>,
    to_client: mpsc::UnboundedSender<ServerMessage>,
}

impl ServerEnd {
    pub fn push(&self, msg: ServerMessage) {
        let _ = self.to_client.send(msg);
    }

    pub async fn recv(&mut self) -> ClientMessage {
        timeout(WAIT, self.from_client.recv())
            .await
            .expect("timed out waiting for a client message")
            .expect("signaling released")
    }

    /// Collects everything the client still sends until it releases the
    /// connection.
    pub async fn drain_until_released(&mut self) -> Vec<ClientMessage> {
        let mut messages = Vec::new();
        loop {
            match timeout(WAIT, self.from_client.recv()).await {
                Ok(Some(msg)) => messages.push(msg),
                Ok(None) => return messages,
                Err(_) => panic!("signaling not released; got {:?}", messages),
            }
        }
    }

    /// Everything sent within `wait`, without requiring a release.
    pub async fn collect_for(&mut self, wait: Duration) -> Vec<ClientMessage> {
        let mut messages = Vec::new();
        let deadline = tokio::time::Instant::now() + wait;
        while let Ok(Some(msg)) = tokio::time::timeout_at(deadline, self.from_client.recv()).await {
            messages.push(msg);
        }
        messages
    }
}

/// Connector handing each connection's server end to the test.
#[derive(Clone)]
pub struct MockSignaling {
    ends: mpsc::UnboundedSender<ServerEnd>,
    refuse: bool,
    journal: Journal,
}

impl MockSignaling {
    pub fn new(journal: Journal) -> (Self, mpsc::UnboundedReceiver<ServerEnd>) {
        let (ends, rx) = mpsc::unbounded_channel();
        (
            Self {
                ends,
                refuse: false,
                journal,
            },
            rx,
        )
    }

    pub fn refusing() -> Self {
        let (ends, _rx) = mpsc::unbounded_channel();
        Self {
            ends,
            refuse: true,
            journal: Journal::default(),
        }
    }
}

#[async_trait]
impl SignalingConnector for MockSignaling {
    async fn connect(&self, url: &str) -> Result<SignalingLink> {
        if self.refuse {
            bail!("connection to {url} refused");
        }
        let local_id = ConnectionId::new();
        let (outbound, mut client_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (forward_tx, from_client) = mpsc::unbounded_channel();

        // Relays client messages to the test, journaling each one and the
        // moment the client drops its sender.
        let journal = self.journal.clone();
        tokio::spawn(async move {
            while let Some(msg) = client_rx.recv().await {
                let op = serde_json::to_value(&msg)
                    .ok()
                    .and_then(|v| v["op"].as_str().map(str::to_owned))
                    .unwrap_or_default();
                journal.record(format!("sent {op}"));
                let _ = forward_tx.send(msg);
            }
            journal.record("signaling released");
        });

        let _ = self.ends.send(ServerEnd {
            local_id,
            from_client,
            to_client,
        });

        Ok(SignalingLink {
            local_id,
            outbound,
            inbound,
        })
    }
}

use crate::signaling::{SignalingConnector, SignalingLink};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures::{SinkExt, Stream, StreamExt};
use std::time::Duration;
use tandem_core::{ClientMessage, ConnectionId, ServerMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

const WELCOME_TIMEOUT: Duration = Duration::from_secs(10);

/// Signaling over a `tokio-tungstenite` WebSocket with JSON text frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl SignalingConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<SignalingLink> {
        let (stream, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;
        let (mut write, mut read) = stream.split();

        let local_id = tokio::time::timeout(WELCOME_TIMEOUT, await_welcome(&mut read))
            .await
            .context("Timed out waiting for welcome")??;
        info!("Signaling connected as {}", local_id);

        let (outbound, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (in_tx, inbound) = mpsc::unbounded_channel::<ServerMessage>();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize client message: {}", e);
                        continue;
                    }
                };
                if write.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
            debug!("Signaling writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ServerMessage>(text.as_str()) {
                            Ok(msg) => {
                                if in_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Invalid ServerMessage: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Signaling read failed: {}", e);
                        break;
                    }
                }
            }
            debug!("Signaling reader finished");
        });

        Ok(SignalingLink {
            local_id,
            outbound,
            inbound,
        })
    }
}

async fn await_welcome<S>(read: &mut S) -> Result<ConnectionId>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = read.next().await {
        match frame? {
            Message::Text(text) => {
                return match serde_json::from_str::<ServerMessage>(text.as_str())? {
                    ServerMessage::Welcome { connection_id } => Ok(connection_id),
                    other => bail!("expected welcome, got {:?}", other),
                };
            }
            Message::Close(_) => break,
            _ => continue,
        }
    }
    bail!("connection closed before welcome")
}

use crate::signaling::SignalingOutput;
use serde_json::Value;
use std::sync::Arc;
use tandem_core::{ConnectionId, ServerMessage, SignalKind};
use thiserror::Error;
use tracing::debug;

/// The relay target was not connected. Expected under disconnect races and
/// never surfaced to the sender.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("relay target {target} is not connected")]
pub struct RelayMiss {
    pub target: ConnectionId,
}

/// Fire-and-forget forwarding of handshake payloads by identity.
///
/// Payloads are opaque here; only the negotiating peers interpret them.
#[derive(Clone)]
pub struct MessageRelay {
    output: Arc<dyn SignalingOutput>,
}

impl MessageRelay {
    pub fn new(output: Arc<dyn SignalingOutput>) -> Self {
        Self { output }
    }

    pub fn relay(
        &self,
        kind: SignalKind,
        payload: Value,
        sender: ConnectionId,
        target: ConnectionId,
    ) -> Result<(), RelayMiss> {
        debug!("Relaying {:?} from {} to {}", kind, sender, target);

        let msg = ServerMessage::relayed(kind, payload, sender);
        if self.output.deliver(target, msg) {
            Ok(())
        } else {
            Err(RelayMiss { target })
        }
    }
}

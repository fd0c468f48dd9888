use std::sync::{Arc, Mutex, MutexGuard};
use tandem_core::{ConnectionId, ServerMessage};
use tandem_server::{ConnectionRegistry, SignalingOutput, SignalingService};
use tokio::sync::mpsc;

/// A delivery captured by [`MockSignalingOutput`].
#[derive(Debug, Clone, PartialEq)]
pub struct Delivered {
    pub target: ConnectionId,
    pub message: ServerMessage,
}

/// SignalingOutput that records every delivery instead of writing to sockets.
///
/// A target counts as connected while it is in the backing registry, so
/// relay misses behave like in production.
#[derive(Clone)]
pub struct MockSignalingOutput {
    registry: ConnectionRegistry,
    delivered: Arc<Mutex<Vec<Delivered>>>,
}

impl MockSignalingOutput {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self {
            registry,
            delivered: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn log(&self) -> MutexGuard<'_, Vec<Delivered>> {
        self.delivered.lock().unwrap()
    }

    pub fn all(&self) -> Vec<Delivered> {
        self.log().clone()
    }

    /// Messages delivered to one connection, in delivery order.
    pub fn messages_for(&self, target: &ConnectionId) -> Vec<ServerMessage> {
        self.log()
            .iter()
            .filter(|d| &d.target == target)
            .map(|d| d.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.log().clear();
    }
}

impl SignalingOutput for MockSignalingOutput {
    fn deliver(&self, target: ConnectionId, message: ServerMessage) -> bool {
        tracing::debug!("[MockSignaling] deliver {:?} to {}", message, target);

        if !self.registry.exists(&target) {
            return false;
        }
        self.log().push(Delivered { target, message });
        true
    }
}

/// A service wired to a recording output, plus the outboxes' receivers
/// kept alive so registrations stay valid.
pub struct TestService {
    pub service: SignalingService,
    pub output: MockSignalingOutput,
    outboxes: Vec<mpsc::UnboundedReceiver<ServerMessage>>,
}

impl TestService {
    pub fn new() -> Self {
        let registry = ConnectionRegistry::new();
        let output = MockSignalingOutput::new(registry.clone());
        let service = SignalingService::with_output(registry, Arc::new(output.clone()));
        Self {
            service,
            output,
            outboxes: Vec::new(),
        }
    }

    pub fn connect(&mut self) -> ConnectionId {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outboxes.push(rx);
        self.service.connect(tx)
    }
}

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tandem_client::{
    FrameSink, PeerTransport, PeerTransportFactory, TransportConfig, TransportEvent,
    TransportState, VideoFrame,
};
use tandem_core::{IceCandidate, SessionDescription};
use tokio::sync::{Mutex, mpsc};

use crate::utils::Journal;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    CreateOffer,
    CreateAnswer,
    SetRemote(SessionDescription),
    AddCandidate(IceCandidate),
    AddLocalVideo,
    Close,
}

#[derive(Debug, Clone)]
pub struct MockTransportConfig {
    /// Local candidates reported right after creation.
    pub early_candidates: usize,
    pub offer_delay: Duration,
    pub reject_remote: bool,
    pub fail_close: bool,
}

impl Default for MockTransportConfig {
    fn default() -> Self {
        Self {
            early_candidates: 0,
            offer_delay: Duration::ZERO,
            reject_remote: false,
            fail_close: false,
        }
    }
}

/// Transport that reports `Connected` once both descriptions are in place.
pub struct MockTransport {
    pub id: usize,
    config: MockTransportConfig,
    events: mpsc::Sender<TransportEvent>,
    calls: Mutex<Vec<TransportCall>>,
    frames: Arc<Mutex<Vec<VideoFrame>>>,
    local_set: AtomicBool,
    remote_set: AtomicBool,
    connected: AtomicBool,
    journal: Journal,
}

impl MockTransport {
    pub async fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().await.clone()
    }

    pub async fn frames(&self) -> Vec<VideoFrame> {
        self.frames.lock().await.clone()
    }

    pub async fn is_closed(&self) -> bool {
        self.calls.lock().await.contains(&TransportCall::Close)
    }

    /// Reports an event as if the platform transport raised it.
    pub async fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event).await;
    }

    async fn record(&self, call: TransportCall) {
        tracing::debug!("[MockTransport {}] {:?}", self.id, call);
        self.calls.lock().await.push(call);
    }

    async fn maybe_connect(&self) {
        if self.local_set.load(Ordering::SeqCst)
            && self.remote_set.load(Ordering::SeqCst)
            && !self.connected.swap(true, Ordering::SeqCst)
        {
            self.emit(TransportEvent::StateChanged(TransportState::Connected))
                .await;
        }
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn create_local_offer(&self) -> Result<SessionDescription> {
        self.record(TransportCall::CreateOffer).await;
        if !self.config.offer_delay.is_zero() {
            tokio::time::sleep(self.config.offer_delay).await;
        }
        self.local_set.store(true, Ordering::SeqCst);
        self.maybe_connect().await;
        Ok(SessionDescription::offer(format!("v=0 mock-offer-{}", self.id)))
    }

    async fn create_local_answer(&self) -> Result<SessionDescription> {
        self.record(TransportCall::CreateAnswer).await;
        if !self.remote_set.load(Ordering::SeqCst) {
            bail!("no remote offer");
        }
        self.local_set.store(true, Ordering::SeqCst);
        self.maybe_connect().await;
        Ok(SessionDescription::answer(format!("v=0 mock-answer-{}", self.id)))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(TransportCall::SetRemote(desc)).await;
        if self.config.reject_remote {
            bail!("malformed description");
        }
        self.remote_set.store(true, Ordering::SeqCst);
        self.maybe_connect().await;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record(TransportCall::AddCandidate(candidate)).await;
        Ok(())
    }

    async fn add_local_video(&self) -> Result<Arc<dyn FrameSink>> {
        self.record(TransportCall::AddLocalVideo).await;
        Ok(Arc::new(RecordingSink {
            frames: self.frames.clone(),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.record(TransportCall::Close).await;
        self.journal.record("transport closed");
        if self.config.fail_close {
            bail!("close failed");
        }
        let _ = self
            .events
            .try_send(TransportEvent::StateChanged(TransportState::Closed));
        Ok(())
    }
}

struct RecordingSink {
    frames: Arc<Mutex<Vec<VideoFrame>>>,
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn write(&self, frame: &VideoFrame) -> Result<()> {
        self.frames.lock().await.push(frame.clone());
        Ok(())
    }
}

/// Creates [`MockTransport`]s and keeps them for inspection.
#[derive(Clone)]
pub struct MockTransportFactory {
    config: MockTransportConfig,
    created: Arc<Mutex<Vec<Arc<MockTransport>>>>,
    journal: Journal,
}

impl MockTransportFactory {
    pub fn new(config: MockTransportConfig, journal: Journal) -> Self {
        Self {
            config,
            created: Arc::new(Mutex::new(Vec::new())),
            journal,
        }
    }

    pub async fn created(&self) -> Vec<Arc<MockTransport>> {
        self.created.lock().await.clone()
    }

    pub async fn latest(&self) -> Arc<MockTransport> {
        self.created
            .lock()
            .await
            .last()
            .cloned()
            .expect("no transport created yet")
    }
}

#[async_trait]
impl PeerTransportFactory for MockTransportFactory {
    async fn create(
        &self,
        _config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>> {
        let mut created = self.created.lock().await;
        let transport = Arc::new(MockTransport {
            id: created.len(),
            config: self.config.clone(),
            events: events.clone(),
            calls: Mutex::new(Vec::new()),
            frames: Arc::new(Mutex::new(Vec::new())),
            local_set: AtomicBool::new(false),
            remote_set: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            journal: self.journal.clone(),
        });

        for i in 0..self.config.early_candidates {
            let candidate = IceCandidate::new(format!("early-{}-{}", transport.id, i));
            let _ = events.send(TransportEvent::LocalCandidate(candidate)).await;
        }

        created.push(transport.clone());
        Ok(transport)
    }
}

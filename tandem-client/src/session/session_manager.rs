use crate::config::ClientConfig;
use crate::error::{AcquisitionError, NegotiationError, SessionError};
use crate::media::{FilterKind, FramePipeline, FrameTransform, MediaHandle, MediaSource, Passthrough};
use crate::negotiation::{Action, NegotiationState, Negotiator};
use crate::session::SessionEvent;
use crate::session::session_handle::{Command, SessionHandle};
use crate::signaling::{SignalingConnector, SignalingLink, WsConnector};
use crate::transport::{PeerTransport, PeerTransportFactory, TransportEvent, WebRtcTransportFactory};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::{Future, pending};
use std::sync::Arc;
use tandem_core::{
    ClientMessage, ConnectionId, IceCandidate, Role, RoomId, ServerMessage, SessionDescription,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

const TRANSPORT_EVENT_CAPACITY: usize = 256;

pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

/// Everything a session consumes from the platform.
#[derive(Clone)]
pub struct Collaborators {
    pub media: Arc<dyn MediaSource>,
    pub transform: Arc<dyn FrameTransform>,
    pub transports: Arc<dyn PeerTransportFactory>,
    pub signaling: Arc<dyn SignalingConnector>,
}

impl Collaborators {
    /// WebSocket signaling, `webrtc` transports and no filtering.
    pub fn native(media: Arc<dyn MediaSource>) -> Self {
        Self {
            media,
            transform: Arc::new(Passthrough),
            transports: Arc::new(WebRtcTransportFactory),
            signaling: Arc::new(WsConnector),
        }
    }
}

enum Outcome {
    OfferCreated(anyhow::Result<SessionDescription>),
    AnswerCreated(anyhow::Result<SessionDescription>),
    RemoteApplied(anyhow::Result<()>),
}

/// Result of transport work started for negotiation `epoch`.
struct Completion {
    epoch: u64,
    outcome: Outcome,
}

/// Owner of one room membership.
///
/// Runs as a single task that handles commands, signaling messages,
/// transport events and completions of transport work one at a time.
/// Transport work runs in spawned tasks and reports back tagged with the
/// negotiation epoch, so results that outlive their negotiation are
/// dropped.
pub struct SessionManager {
    config: ClientConfig,
    room: RoomId,
    local_id: ConnectionId,
    collaborators: Collaborators,

    negotiator: Negotiator,
    transport: Option<Arc<dyn PeerTransport>>,
    transport_events: Option<mpsc::Receiver<TransportEvent>>,
    media: Option<MediaHandle>,
    pipeline: Option<FramePipeline>,

    signaling_out: Option<mpsc::UnboundedSender<ClientMessage>>,
    signaling_in: mpsc::UnboundedReceiver<ServerMessage>,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,

    events: mpsc::UnboundedSender<SessionEvent>,
    state: watch::Sender<NegotiationState>,
    joined: bool,
    finished: bool,
}

impl SessionManager {
    /// Acquires media, starts the filter pipeline, connects signaling,
    /// prepares a transport and joins `room`.
    ///
    /// Fails without joining if any of those steps fails; whatever was
    /// already set up is released again.
    pub async fn start(
        config: ClientConfig,
        collaborators: Collaborators,
        room: RoomId,
    ) -> Result<(SessionHandle, SessionEvents), SessionError> {
        let mut media = collaborators.media.acquire().await.map_err(|e| {
            error!("Local media unavailable: {}", e);
            e
        })?;
        debug!("Local media {} acquired", media.id());

        let Some(frames) = media.take_frames() else {
            collaborators.media.release(media).await;
            return Err(AcquisitionError::Other("media handle carries no frames".to_owned()).into());
        };
        let pipeline = FramePipeline::spawn(frames, collaborators.transform.clone(), FilterKind::None);

        let link = match collaborators.signaling.connect(&config.server_url).await {
            Ok(link) => link,
            Err(e) => {
                error!("Signaling connection failed: {:#}", e);
                pipeline.stop().await;
                collaborators.media.release(media).await;
                return Err(SessionError::Signaling(e));
            }
        };
        let SignalingLink {
            local_id,
            outbound,
            inbound,
        } = link;

        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (state, state_rx) = watch::channel(NegotiationState::Idle);
        let preview = pipeline.preview_sender();

        let mut session = Self {
            config,
            room: room.clone(),
            local_id,
            collaborators,
            negotiator: Negotiator::new(1),
            transport: None,
            transport_events: None,
            media: Some(media),
            pipeline: Some(pipeline),
            signaling_out: Some(outbound),
            signaling_in: inbound,
            commands,
            completions_tx,
            completions_rx,
            events: events_tx,
            state,
            joined: false,
            finished: false,
        };

        if let Err(e) = session.open_transport().await {
            error!("Peer transport setup failed: {:#}", e);
            session.shutdown().await;
            return Err(SessionError::Transport(e));
        }

        info!("Joining room {} as {}", room, local_id);
        session.send(ClientMessage::JoinRoom {
            room_id: room.clone(),
        });
        session.joined = true;
        session.emit(SessionEvent::Joined {
            room: room.clone(),
            local_id,
        });

        tokio::spawn(session.run());

        let handle = SessionHandle::new(local_id, room, commands_tx, state_rx, preview);
        Ok((handle, events))
    }

    async fn run(mut self) {
        info!("Session {} event loop started", self.local_id);

        while !self.finished {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Leave { done }) => {
                        self.shutdown().await;
                        let _ = done.send(());
                    }
                    Some(Command::SetFilter(kind)) => {
                        if let Some(pipeline) = &self.pipeline {
                            pipeline.set_filter(kind);
                        }
                    }
                    None => {
                        info!("Session handle dropped");
                        self.shutdown().await;
                    }
                },

                Some(completion) = self.completions_rx.recv() => {
                    self.on_completion(completion).await;
                }

                msg = self.signaling_in.recv() => match msg {
                    Some(msg) => self.on_server_message(msg).await,
                    None => self.fail("signaling connection lost").await,
                },

                Some(event) = next_transport_event(&mut self.transport_events) => {
                    self.on_transport_event(event).await;
                }
            }
        }

        info!("Session {} event loop finished", self.local_id);
    }

    async fn on_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome { connection_id } => {
                debug!("Repeated welcome for {}", connection_id);
            }
            ServerMessage::PeerJoined { peer_id } => {
                self.on_peer_identified(peer_id, Role::INCUMBENT).await;
            }
            ServerMessage::PeerAlreadyPresent { peer_id } => {
                self.on_peer_identified(peer_id, Role::JOINER).await;
            }
            ServerMessage::PeerLeft { peer_id } => self.on_peer_left(peer_id).await,
            ServerMessage::RoomFull { room_id } => {
                warn!("Room {} is full", room_id);
                self.emit(SessionEvent::RoomFull);
                self.shutdown().await;
            }
            ServerMessage::Offer { payload, sender_id } => {
                if let Some(offer) = self.decode::<SessionDescription>(payload, "offer") {
                    let step = self.negotiator.remote_offer(sender_id, offer);
                    self.apply(step).await;
                }
            }
            ServerMessage::Answer { payload, sender_id } => {
                if let Some(answer) = self.decode::<SessionDescription>(payload, "answer") {
                    let step = self.negotiator.remote_answer(sender_id, answer);
                    self.apply(step).await;
                }
            }
            ServerMessage::Candidate { payload, sender_id } => {
                if let Some(candidate) = self.decode::<IceCandidate>(payload, "candidate") {
                    let step = self.negotiator.remote_candidate(sender_id, candidate);
                    self.apply(step).await;
                }
            }
            ServerMessage::Error { message } => {
                warn!("Server rejected a message: {}", message);
            }
        }
    }

    async fn on_peer_identified(&mut self, peer: ConnectionId, role: Role) {
        if self.negotiator.is_replaced_by(peer, role) {
            let stale = self.negotiator.remote_id();
            warn!(
                "Counterpart {:?} replaced by {} in {:?}",
                stale,
                peer,
                self.negotiator.state()
            );
            self.negotiator.close();
            self.publish_state();
            self.close_transport().await;
            if let Some(stale) = stale {
                self.emit(SessionEvent::PeerLeft { peer: stale });
            }
        }

        if self.negotiator.is_terminal() {
            let epoch = self.negotiator.epoch() + 1;
            info!("New counterpart {}, starting negotiation epoch {}", peer, epoch);
            self.negotiator = Negotiator::new(epoch);
            self.publish_state();

            if self.transport.is_none() {
                if let Err(e) = self.open_transport().await {
                    self.fail(format!("peer transport setup failed: {e:#}")).await;
                    return;
                }
            }
        }

        let step = self.negotiator.assign_peer(peer, role);
        if step.is_ok() {
            self.emit(SessionEvent::PeerIdentified { peer, role });
        }
        self.apply(step).await;
    }

    async fn on_peer_left(&mut self, peer: ConnectionId) {
        let was_live = !self.negotiator.is_terminal();
        let step = self.negotiator.peer_left(peer);
        let closed = was_live && step.is_ok();
        self.apply(step).await;

        if closed {
            self.close_transport().await;
            self.emit(SessionEvent::PeerLeft { peer });
        }
    }

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::LocalCandidate(candidate) => {
                let step = self.negotiator.local_candidate(candidate);
                self.apply(step).await;
            }
            TransportEvent::RemoteTrack(track) => {
                info!("Remote {:?} track {} arrived", track.kind, track.id);
                self.emit(SessionEvent::RemoteTrack(track));
            }
            TransportEvent::StateChanged(state) => {
                debug!("Transport state {:?}", state);
                let step = self.negotiator.transport_state(state);
                self.apply(step).await;
                if self.negotiator.state() == NegotiationState::Failed {
                    self.fail("peer connection lost").await;
                }
            }
        }
    }

    async fn on_completion(&mut self, completion: Completion) {
        if completion.epoch != self.negotiator.epoch() || self.negotiator.is_terminal() {
            debug!(
                "Dropped completion of epoch {} (current {}, {:?})",
                completion.epoch,
                self.negotiator.epoch(),
                self.negotiator.state()
            );
            return;
        }

        match completion.outcome {
            Outcome::OfferCreated(Ok(offer)) => {
                let step = self.negotiator.local_offer_created(offer);
                self.apply(step).await;
            }
            Outcome::AnswerCreated(Ok(answer)) => {
                let step = self.negotiator.local_answer_created(answer);
                self.apply(step).await;
            }
            Outcome::RemoteApplied(Ok(())) => {
                let step = self.negotiator.remote_description_applied();
                self.apply(step).await;
            }
            Outcome::OfferCreated(Err(e)) => {
                self.fail(format!("offer creation failed: {e:#}")).await;
            }
            Outcome::AnswerCreated(Err(e)) => {
                self.fail(format!("answer creation failed: {e:#}")).await;
            }
            Outcome::RemoteApplied(Err(e)) => {
                self.fail(format!("remote description rejected: {e:#}")).await;
            }
        }
    }

    async fn apply(&mut self, step: Result<Vec<Action>, NegotiationError>) {
        match step {
            Ok(actions) => {
                for action in actions {
                    self.execute(action).await;
                }
            }
            Err(e) => warn!("Ignoring handshake event: {}", e),
        }
        self.publish_state();
    }

    async fn execute(&mut self, action: Action) {
        match action {
            Action::Send(msg) => self.send(msg),
            Action::CreateOffer => self.spawn_work(|transport| async move {
                Outcome::OfferCreated(transport.create_local_offer().await)
            }),
            Action::CreateAnswer => self.spawn_work(|transport| async move {
                Outcome::AnswerCreated(transport.create_local_answer().await)
            }),
            Action::ApplyRemoteDescription(desc) => self.spawn_work(move |transport| async move {
                Outcome::RemoteApplied(transport.set_remote_description(desc).await)
            }),
            Action::AddRemoteCandidate(candidate) => {
                if let Some(transport) = &self.transport {
                    if let Err(e) = transport.add_remote_candidate(candidate).await {
                        warn!("Remote candidate rejected: {:#}", e);
                    }
                }
            }
        }
    }

    fn spawn_work<F, Fut>(&self, work: F)
    where
        F: FnOnce(Arc<dyn PeerTransport>) -> Fut,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let Some(transport) = self.transport.clone() else {
            warn!("No transport for pending negotiation work");
            return;
        };
        let epoch = self.negotiator.epoch();
        let completions = self.completions_tx.clone();
        let fut = work(transport);
        tokio::spawn(async move {
            let outcome = fut.await;
            let _ = completions.send(Completion { epoch, outcome });
        });
    }

    async fn open_transport(&mut self) -> anyhow::Result<()> {
        let (events_tx, events_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);
        let transport = self
            .collaborators
            .transports
            .create(&self.config.transport_config(), events_tx)
            .await
            .context("Failed to create peer transport")?;

        match transport.add_local_video().await {
            Ok(sink) => {
                if let Some(pipeline) = &self.pipeline {
                    pipeline.attach_sink(Some(sink));
                }
            }
            Err(e) => {
                if let Err(close) = transport.close().await {
                    warn!("Transport close failed: {:#}", close);
                }
                return Err(e.context("Failed to attach local video"));
            }
        }

        self.transport = Some(transport);
        self.transport_events = Some(events_rx);
        Ok(())
    }

    async fn close_transport(&mut self) {
        if let Some(pipeline) = &self.pipeline {
            pipeline.attach_sink(None);
        }
        self.transport_events = None;
        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("Transport close failed: {:#}", e);
            }
        }
    }

    async fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        error!("Session failed: {}", reason);
        self.negotiator.fail();
        self.publish_state();
        self.emit(SessionEvent::Failed(reason));
        self.shutdown().await;
    }

    /// Best-effort cleanup: every step runs whatever happened before it.
    async fn shutdown(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        info!("Session {} leaving room {}", self.local_id, self.room);

        self.negotiator.close();
        self.publish_state();

        if let Some(pipeline) = self.pipeline.take() {
            pipeline.stop().await;
        }
        if let Some(media) = self.media.take() {
            debug!("Releasing local media {}", media.id());
            self.collaborators.media.release(media).await;
        }

        self.close_transport().await;

        if self.joined {
            self.send(ClientMessage::LeaveRoom {
                room_id: self.room.clone(),
            });
        }

        self.signaling_out = None;
        self.emit(SessionEvent::Ended);
    }

    fn decode<T: DeserializeOwned>(&self, payload: Value, what: &str) -> Option<T> {
        match serde_json::from_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                let mismatch = NegotiationError::ProtocolMismatch {
                    state: self.negotiator.state(),
                    event: format!("undecodable {what}: {e}"),
                };
                warn!("Ignoring handshake event: {}", mismatch);
                None
            }
        }
    }

    fn send(&self, msg: ClientMessage) {
        match &self.signaling_out {
            Some(outbound) => {
                if outbound.send(msg).is_err() {
                    warn!("Signaling connection gone, message dropped");
                }
            }
            None => debug!("Signaling released, message dropped"),
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn publish_state(&mut self) {
        let state = self.negotiator.state();
        if *self.state.borrow() != state {
            self.state.send_replace(state);
            self.emit(SessionEvent::StateChanged(state));
        }
    }
}

async fn next_transport_event(
    events: &mut Option<mpsc::Receiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}

use crate::error::NegotiationError;
use crate::negotiation::{Action, NegotiationState};
use crate::transport::TransportState;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use tandem_core::{ClientMessage, ConnectionId, IceCandidate, Role, SdpType, SessionDescription};
use tracing::{debug, info, warn};

type Step = Result<Vec<Action>, NegotiationError>;

/// Handshake state machine for one counterpart.
///
/// Performs no I/O. Every input returns the actions the owner must carry
/// out, in order. Inputs that do not fit the current state come back as
/// [`NegotiationError::ProtocolMismatch`] and leave the state untouched.
///
/// Local candidates produced before the counterpart is known are held and
/// flushed in generation order once it is. Remote candidates that arrive
/// before the remote description is installed are held the same way.
#[derive(Debug)]
pub struct Negotiator {
    epoch: u64,
    state: NegotiationState,
    role: Option<Role>,
    remote_id: Option<ConnectionId>,
    pending_local_candidates: VecDeque<IceCandidate>,
    pending_remote_candidates: VecDeque<IceCandidate>,
    applying_remote: bool,
    remote_description_set: bool,
    answer_sent: bool,
    transport_connected: bool,
}

impl Negotiator {
    /// `epoch` tags every asynchronous completion belonging to this attempt.
    pub fn new(epoch: u64) -> Self {
        Self {
            epoch,
            state: NegotiationState::Idle,
            role: None,
            remote_id: None,
            pending_local_candidates: VecDeque::new(),
            pending_remote_candidates: VecDeque::new(),
            applying_remote: false,
            remote_description_set: false,
            answer_sent: false,
            transport_connected: false,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn remote_id(&self) -> Option<ConnectionId> {
        self.remote_id
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn pending_local_candidates(&self) -> usize {
        self.pending_local_candidates.len()
    }

    pub fn pending_remote_candidates(&self) -> usize {
        self.pending_remote_candidates.len()
    }

    /// Whether a fresh identification of `peer` as counterpart with `role`
    /// replaces the counterpart this live negotiation is running against.
    /// The server announces a new counterpart only after the old one left
    /// the room, so the old negotiation cannot complete anymore.
    pub fn is_replaced_by(&self, peer: ConnectionId, role: Role) -> bool {
        !self.is_terminal()
            && self
                .remote_id
                .is_some_and(|current| current != peer || self.role != Some(role))
    }

    pub fn assign_peer(&mut self, peer: ConnectionId, role: Role) -> Step {
        if self.state != NegotiationState::Idle {
            return Err(self.mismatch(format!("peer {peer} identified again")));
        }

        info!("Counterpart {} identified, local role {:?}", peer, role);
        self.remote_id = Some(peer);
        self.role = Some(role);
        self.state = NegotiationState::RoleAssigned;

        let mut actions: Vec<Action> = self
            .pending_local_candidates
            .drain(..)
            .map(|candidate| Action::Send(candidate_message(&candidate, peer)))
            .collect();
        if !actions.is_empty() {
            debug!("Flushing {} early local candidates", actions.len());
        }

        if role.is_offerer() {
            self.state = NegotiationState::OfferPending;
            actions.push(Action::CreateOffer);
        } else {
            self.state = NegotiationState::AwaitingOffer;
        }
        Ok(actions)
    }

    pub fn local_candidate(&mut self, candidate: IceCandidate) -> Step {
        if self.is_terminal() {
            debug!("Local candidate after {:?} dropped", self.state);
            return Ok(vec![]);
        }
        match self.remote_id {
            Some(peer) => Ok(vec![Action::Send(candidate_message(&candidate, peer))]),
            None => {
                debug!("Local candidate held until the counterpart is known");
                self.pending_local_candidates.push_back(candidate);
                Ok(vec![])
            }
        }
    }

    pub fn local_offer_created(&mut self, offer: SessionDescription) -> Step {
        let peer = match (self.state, self.remote_id) {
            (NegotiationState::OfferPending, Some(peer)) => peer,
            _ => return Err(self.mismatch("local offer")),
        };
        self.state = NegotiationState::AwaitingAnswer;
        Ok(vec![Action::Send(ClientMessage::Offer {
            payload: encode(&offer),
            target_id: peer,
        })])
    }

    pub fn remote_offer(&mut self, sender: ConnectionId, offer: SessionDescription) -> Step {
        self.check_sender(sender, "offer")?;
        if self.state != NegotiationState::AwaitingOffer || offer.kind != SdpType::Offer {
            return Err(self.mismatch("remote offer"));
        }
        self.state = NegotiationState::AnswerPending;
        self.applying_remote = true;
        Ok(vec![Action::ApplyRemoteDescription(offer)])
    }

    pub fn remote_answer(&mut self, sender: ConnectionId, answer: SessionDescription) -> Step {
        self.check_sender(sender, "answer")?;
        if self.state != NegotiationState::AwaitingAnswer
            || answer.kind != SdpType::Answer
            || self.applying_remote
            || self.remote_description_set
        {
            return Err(self.mismatch("remote answer"));
        }
        self.applying_remote = true;
        Ok(vec![Action::ApplyRemoteDescription(answer)])
    }

    pub fn remote_description_applied(&mut self) -> Step {
        if !self.applying_remote || self.is_terminal() {
            return Err(self.mismatch("remote description applied"));
        }
        self.applying_remote = false;
        self.remote_description_set = true;

        let mut actions: Vec<Action> = self
            .pending_remote_candidates
            .drain(..)
            .map(Action::AddRemoteCandidate)
            .collect();

        match self.state {
            NegotiationState::AwaitingAnswer => {
                self.state = NegotiationState::Connected;
            }
            NegotiationState::AnswerPending => {
                actions.push(Action::CreateAnswer);
            }
            _ => return Err(self.mismatch("remote description applied")),
        }
        Ok(actions)
    }

    pub fn local_answer_created(&mut self, answer: SessionDescription) -> Step {
        let peer = match (self.state, self.remote_id) {
            (NegotiationState::AnswerPending, Some(peer))
                if self.remote_description_set && !self.answer_sent =>
            {
                peer
            }
            _ => return Err(self.mismatch("local answer")),
        };
        self.answer_sent = true;
        if self.transport_connected {
            self.state = NegotiationState::Connected;
        }
        Ok(vec![Action::Send(ClientMessage::Answer {
            payload: encode(&answer),
            target_id: peer,
        })])
    }

    pub fn remote_candidate(&mut self, sender: ConnectionId, candidate: IceCandidate) -> Step {
        if self.is_terminal() {
            debug!("Remote candidate after {:?} dropped", self.state);
            return Ok(vec![]);
        }
        self.check_sender(sender, "candidate")?;
        if self.remote_description_set {
            Ok(vec![Action::AddRemoteCandidate(candidate)])
        } else {
            self.pending_remote_candidates.push_back(candidate);
            Ok(vec![])
        }
    }

    pub fn transport_state(&mut self, transport: TransportState) -> Step {
        if self.is_terminal() {
            return Ok(vec![]);
        }
        match transport {
            TransportState::Connected => {
                self.transport_connected = true;
                if self.state == NegotiationState::AnswerPending && self.answer_sent {
                    self.state = NegotiationState::Connected;
                }
            }
            state if state.is_failure() => {
                warn!("Transport reported {:?} in {:?}", state, self.state);
                self.state = NegotiationState::Failed;
            }
            _ => {}
        }
        Ok(vec![])
    }

    pub fn peer_left(&mut self, peer: ConnectionId) -> Step {
        if self.is_terminal() {
            return Ok(vec![]);
        }
        if self.remote_id != Some(peer) {
            return Err(self.mismatch(format!("peer-left for unknown peer {peer}")));
        }
        info!("Counterpart {} left", peer);
        self.state = NegotiationState::Closed;
        Ok(vec![])
    }

    /// Local leave. Returns whether the state changed.
    pub fn close(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = NegotiationState::Closed;
        true
    }

    /// Unrecoverable error. Returns whether the state changed.
    pub fn fail(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = NegotiationState::Failed;
        true
    }

    fn check_sender(&self, sender: ConnectionId, event: &str) -> Result<(), NegotiationError> {
        match self.remote_id {
            Some(peer) if peer == sender => Ok(()),
            _ => Err(self.mismatch(format!("{event} from unexpected sender {sender}"))),
        }
    }

    fn mismatch(&self, event: impl Into<String>) -> NegotiationError {
        NegotiationError::mismatch(self.state, event)
    }
}

fn candidate_message(candidate: &IceCandidate, target: ConnectionId) -> ClientMessage {
    ClientMessage::Candidate {
        payload: encode(candidate),
        target_id: target,
    }
}

fn encode<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!("Failed to encode handshake payload: {}", e);
        Value::Null
    })
}

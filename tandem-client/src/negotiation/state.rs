/// Progress of one handshake with one counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Idle,
    /// Counterpart known, role fixed. Left immediately for the role's path.
    RoleAssigned,
    /// Offerer: local offer is being generated.
    OfferPending,
    /// Answerer: waiting for the counterpart's offer.
    AwaitingOffer,
    /// Answerer: offer received, answer being generated or sent.
    AnswerPending,
    /// Offerer: offer sent, waiting for the answer to arrive and apply.
    AwaitingAnswer,
    Connected,
    Closed,
    Failed,
}

impl NegotiationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

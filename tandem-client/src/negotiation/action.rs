use tandem_core::{ClientMessage, IceCandidate, SessionDescription};

/// Side effects requested by the [`Negotiator`](super::Negotiator). The
/// owner performs them in order and feeds completions back.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Hand a message to the signaling connection.
    Send(ClientMessage),
    /// Generate the local offer; report via `local_offer_created`.
    CreateOffer,
    /// Generate the local answer; report via `local_answer_created`.
    CreateAnswer,
    /// Install the counterpart's description; report via
    /// `remote_description_applied`.
    ApplyRemoteDescription(SessionDescription),
    AddRemoteCandidate(IceCandidate),
}

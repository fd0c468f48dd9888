use crate::negotiation::NegotiationState;
use thiserror::Error;

/// Local media could not be obtained. Fatal to starting a session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("media permission denied")]
    PermissionDenied,
    #[error("no capture device available")]
    NoDevice,
    #[error("media acquisition failed: {0}")]
    Other(String),
}

/// A handshake event that the negotiation cannot apply in its current state.
/// Logged and ignored by the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("protocol mismatch in state {state:?}: {event}")]
    ProtocolMismatch {
        state: NegotiationState,
        event: String,
    },
}

impl NegotiationError {
    pub(crate) fn mismatch(state: NegotiationState, event: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            state,
            event: event.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error("signaling unavailable: {0:#}")]
    Signaling(anyhow::Error),

    #[error("peer transport setup failed: {0:#}")]
    Transport(anyhow::Error),

    #[error("session already ended")]
    Closed,
}

use crate::error::SessionError;
use crate::media::{FilterKind, VideoFrame};
use crate::negotiation::NegotiationState;
use tandem_core::{ConnectionId, RoomId};
use tokio::sync::{broadcast, mpsc, oneshot, watch};

pub(crate) enum Command {
    Leave { done: oneshot::Sender<()> },
    SetFilter(FilterKind),
}

/// Control surface of a running session. Dropping the handle ends the
/// session the same way `leave` does.
pub struct SessionHandle {
    local_id: ConnectionId,
    room: RoomId,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<NegotiationState>,
    preview: broadcast::Sender<VideoFrame>,
}

impl SessionHandle {
    pub(crate) fn new(
        local_id: ConnectionId,
        room: RoomId,
        commands: mpsc::UnboundedSender<Command>,
        state: watch::Receiver<NegotiationState>,
        preview: broadcast::Sender<VideoFrame>,
    ) -> Self {
        Self {
            local_id,
            room,
            commands,
            state,
            preview,
        }
    }

    pub fn local_id(&self) -> ConnectionId {
        self.local_id
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn state(&self) -> NegotiationState {
        *self.state.borrow()
    }

    /// Leaves the room and waits until cleanup has run.
    pub async fn leave(&self) -> Result<(), SessionError> {
        let (done, finished) = oneshot::channel();
        self.commands
            .send(Command::Leave { done })
            .map_err(|_| SessionError::Closed)?;
        finished.await.map_err(|_| SessionError::Closed)
    }

    pub fn set_filter(&self, kind: FilterKind) -> Result<(), SessionError> {
        self.commands
            .send(Command::SetFilter(kind))
            .map_err(|_| SessionError::Closed)
    }

    /// Filtered local frames, as sent to the counterpart.
    pub fn preview(&self) -> broadcast::Receiver<VideoFrame> {
        self.preview.subscribe()
    }
}

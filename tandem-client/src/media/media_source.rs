use crate::error::AcquisitionError;
use crate::media::VideoFrame;
use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Live local capture. Frames arrive on the receiver until the source is
/// released.
#[derive(Debug)]
pub struct MediaHandle {
    id: Uuid,
    frames: Option<mpsc::Receiver<VideoFrame>>,
}

impl MediaHandle {
    pub fn new(frames: mpsc::Receiver<VideoFrame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            frames: Some(frames),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The frame stream can be handed out once, to the pipeline.
    pub fn take_frames(&mut self) -> Option<mpsc::Receiver<VideoFrame>> {
        self.frames.take()
    }
}

/// Camera (or any other capture device) access.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<MediaHandle, AcquisitionError>;

    async fn release(&self, handle: MediaHandle);
}

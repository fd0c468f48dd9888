use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Visual filters offered to the participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    None,
    Beauty,
    Blur,
    Glasses,
}

/// One captured video frame.
///
/// `data` is whatever the media source produces for the configured codec;
/// the pipeline never inspects it, only transforms do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub duration: Duration,
}

impl VideoFrame {
    pub fn new(data: impl Into<Bytes>, width: u32, height: u32, duration: Duration) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            duration,
        }
    }
}

/// Per-frame filter. Pure: the same frame and kind always give the same
/// output, and nothing in negotiation depends on it.
pub trait FrameTransform: Send + Sync {
    fn apply(&self, frame: VideoFrame, kind: FilterKind) -> VideoFrame;
}

/// Hands every frame back untouched, whatever the filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl FrameTransform for Passthrough {
    fn apply(&self, frame: VideoFrame, _kind: FilterKind) -> VideoFrame {
        frame
    }
}

/// Destination for filtered frames headed to the counterpart.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn write(&self, frame: &VideoFrame) -> Result<()>;
}

pub mod frame;
pub mod media_source;
pub mod pipeline;

pub use frame::{FilterKind, FrameSink, FrameTransform, Passthrough, VideoFrame};
pub use media_source::{MediaHandle, MediaSource};
pub use pipeline::FramePipeline;

use crate::media::{FilterKind, FrameSink, FrameTransform, VideoFrame};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const PREVIEW_CAPACITY: usize = 8;

/// Applies the selected filter to every captured frame, publishes the result
/// for local preview and forwards it to the attached transport sink.
///
/// The filter and the sink can be swapped while frames are flowing.
pub struct FramePipeline {
    filter: watch::Sender<FilterKind>,
    sink: watch::Sender<Option<Arc<dyn FrameSink>>>,
    preview: broadcast::Sender<VideoFrame>,
    task: JoinHandle<()>,
}

impl FramePipeline {
    pub fn spawn(
        mut frames: mpsc::Receiver<VideoFrame>,
        transform: Arc<dyn FrameTransform>,
        initial: FilterKind,
    ) -> Self {
        let (filter, filter_rx) = watch::channel(initial);
        let (sink, sink_rx) = watch::channel::<Option<Arc<dyn FrameSink>>>(None);
        let (preview, _) = broadcast::channel(PREVIEW_CAPACITY);

        let preview_tx = preview.clone();
        let task = tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                let kind = *filter_rx.borrow();
                let filtered = transform.apply(frame, kind);

                let current = sink_rx.borrow().clone();
                if let Some(sink) = current {
                    if let Err(e) = sink.write(&filtered).await {
                        debug!("Dropped outgoing frame: {:#}", e);
                    }
                }

                // No preview subscribers is fine.
                let _ = preview_tx.send(filtered);
            }
            debug!("Frame source ended");
        });

        Self {
            filter,
            sink,
            preview,
            task,
        }
    }

    pub fn set_filter(&self, kind: FilterKind) {
        info!("Filter switched to {:?}", kind);
        self.filter.send_replace(kind);
    }

    pub fn filter(&self) -> FilterKind {
        *self.filter.borrow()
    }

    pub fn attach_sink(&self, sink: Option<Arc<dyn FrameSink>>) {
        self.sink.send_replace(sink);
    }

    pub fn preview(&self) -> broadcast::Receiver<VideoFrame> {
        self.preview.subscribe()
    }

    /// A cloneable handle for subscribing to the preview after the pipeline
    /// has moved into its owner.
    pub fn preview_sender(&self) -> broadcast::Sender<VideoFrame> {
        self.preview.clone()
    }

    pub async fn stop(self) {
        self.task.abort();
        let _ = self.task.await;
        info!("Frame pipeline stopped");
    }
}

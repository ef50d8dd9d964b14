use facelabel_core::FaceRecord;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("detection failed: {0}")]
    Failed(String),
    #[error("detection stream ended")]
    Exhausted,
}

/// Blocking face detection for the current video frame.
///
/// Implementations wrap the external model. They run on the engine thread,
/// so they may block for longer than one tick.
pub trait FaceDetector: Send + 'static {
    fn detect(&mut self) -> Result<Vec<FaceRecord>, DetectorError>;

    fn name(&self) -> &str {
        "detector"
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

impl EngineError {
    /// The detector has no more frames; stop ticking.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, EngineError::Detector(DetectorError::Exhausted))
    }
}

/// Messages sent from the tick loop to the engine thread.
enum EngineRequest {
    Detect {
        reply: oneshot::Sender<Result<Vec<FaceRecord>, DetectorError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Run one detection on the engine thread and wait for the result.
    pub async fn detect(&self) -> Result<Vec<FaceRecord>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Detect { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        let records = reply_rx.await.map_err(|_| EngineError::ChannelClosed)??;
        Ok(records)
    }
}

/// Move `detector` onto a dedicated OS thread and return a handle to it.
///
/// The thread exits once every handle has been dropped.
pub fn spawn_engine<D: FaceDetector>(mut detector: D) -> Result<EngineHandle, EngineError> {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);
    let name = detector.name().to_string();

    std::thread::Builder::new()
        .name("facelabel-engine".into())
        .spawn(move || {
            tracing::info!(detector = %name, "engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Detect { reply } => {
                        let result = detector.detect();
                        match &result {
                            Ok(records) => tracing::trace!(faces = records.len(), "detected"),
                            Err(err) => tracing::debug!(error = %err, "detection returned error"),
                        }
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })?;

    Ok(EngineHandle { tx })
}

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time;
use tokio_util::sync::CancellationToken;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("video capture failed: {0}")]
    Failed(String),
    #[error("recorder did not stop within {0:?} of the auto-stop signal")]
    Stalled(Duration),
}

/// Front-camera clip recorder.
///
/// `record` should stop on its own after `max_duration`, and must stop
/// promptly once `stop` is cancelled. Returns the URI of the saved clip.
#[async_trait]
pub trait VideoRecorder: Send + Sync {
    async fn record(
        &self,
        max_duration: Duration,
        stop: CancellationToken,
    ) -> Result<String, CaptureError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    pub max_duration_ms: u64,
    /// Time the recorder gets to wind down after the auto-stop fires.
    pub stop_grace_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_duration_ms: 1_000,
            stop_grace_ms: 2_000,
        }
    }
}

impl CaptureConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

/// Record one clip, forcing a stop after `max_duration` even if the
/// recorder's own limit never fires.
///
/// Cancelling `cycle` stops the recorder early.
pub async fn record_clip(
    recorder: &dyn VideoRecorder,
    config: &CaptureConfig,
    cycle: &CancellationToken,
) -> Result<String, CaptureError> {
    let max_duration = config.max_duration();
    let stop = cycle.child_token();

    let auto_stop = {
        let stop = stop.clone();
        tokio::spawn(async move {
            time::sleep(max_duration).await;
            stop.cancel();
        })
    };

    let deadline = max_duration + config.stop_grace();
    let result = time::timeout(deadline, recorder.record(max_duration, stop.clone())).await;

    auto_stop.abort();
    stop.cancel();

    match result {
        Ok(Ok(path)) => {
            log_info!("Captured clip {path}");
            Ok(path)
        }
        Ok(Err(err)) => {
            log_warn!("Video capture failed: {err}");
            Err(err)
        }
        Err(_) => {
            log_warn!("Recorder ignored auto-stop; gave up after {deadline:?}");
            Err(CaptureError::Stalled(config.stop_grace()))
        }
    }
}

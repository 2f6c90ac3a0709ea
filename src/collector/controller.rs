use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::{
    capture::{record_clip, CaptureConfig, VideoRecorder},
    db::{Database, NewRecord, Sentiment},
    location::{resolve_location, LocationPolicy, LocationProvider},
    utils::time::now_ms,
};

use super::{CaptureState, CollectError, CycleOutcome, Questionnaire};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub count: u64,
    pub target: u32,
    pub complete: bool,
}

/// Drives one capture cycle at a time: survey, clip, then location and save.
#[derive(Clone)]
pub struct CaptureController {
    state: Arc<Mutex<CaptureState>>,
    /// Stop signal of the cycle currently holding the camera.
    cycle_stop: Arc<Mutex<Option<CancellationToken>>>,
    /// Held for the whole recorder call, including one a reset abandoned.
    camera: Arc<Mutex<()>>,
    db: Database,
    recorder: Arc<dyn VideoRecorder>,
    locator: Arc<dyn LocationProvider>,
    capture: CaptureConfig,
    location: LocationPolicy,
    daily_target: Arc<AtomicU32>,
    events: watch::Sender<CaptureState>,
}

impl CaptureController {
    pub fn new(
        db: Database,
        recorder: Arc<dyn VideoRecorder>,
        locator: Arc<dyn LocationProvider>,
        capture: CaptureConfig,
        location: LocationPolicy,
        daily_target: u32,
    ) -> Self {
        let (events, _) = watch::channel(CaptureState::new());
        Self {
            state: Arc::new(Mutex::new(CaptureState::new())),
            cycle_stop: Arc::new(Mutex::new(None)),
            camera: Arc::new(Mutex::new(())),
            db,
            recorder,
            locator,
            capture,
            location,
            daily_target: Arc::new(AtomicU32::new(daily_target)),
            events,
        }
    }

    pub async fn snapshot(&self) -> CaptureState {
        self.state.lock().await.clone()
    }

    /// Receives every state change, starting with the current state.
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.events.subscribe()
    }

    pub async fn submit_survey(&self, sentiment: Sentiment) -> Result<CaptureState, CollectError> {
        let mut state = self.state.lock().await;
        state.answer_survey(sentiment)?;
        log_info!("Survey answered with {sentiment}");
        Ok(self.publish(&state))
    }

    pub async fn submit_answers(
        &self,
        questionnaire: &Questionnaire,
    ) -> Result<CaptureState, CollectError> {
        let sentiment = questionnaire.score()?;
        self.submit_survey(sentiment).await
    }

    /// Record the clip and, on success, resolve location and save the record.
    ///
    /// A failed capture leaves the cycle on the video step.
    pub async fn record_video(&self) -> Result<i64, CollectError> {
        let (cycle, stop) = {
            let mut state = self.state.lock().await;
            let cycle = state.begin_capture()?;
            let stop = CancellationToken::new();
            *self.cycle_stop.lock().await = Some(stop.clone());
            self.publish(&state);
            (cycle, stop)
        };

        let clip = {
            // Waits out a recorder still winding down from a reset cycle.
            let _camera = self.camera.lock().await;
            if stop.is_cancelled() {
                log_warn!("Cycle {cycle} was reset before the camera was free");
                return Err(CollectError::Discarded);
            }
            record_clip(self.recorder.as_ref(), &self.capture, &stop).await
        };

        match clip {
            Ok(path) => self.locate_and_save(cycle, Some(path)).await,
            Err(err) => {
                let mut state = self.state.lock().await;
                state.capture_failed(cycle);
                self.publish(&state);
                Err(CollectError::CaptureFailed(err))
            }
        }
    }

    /// Continue without a clip.
    pub async fn skip_video(&self) -> Result<i64, CollectError> {
        let cycle = {
            let mut state = self.state.lock().await;
            let cycle = state.begin_capture()?;
            self.publish(&state);
            cycle
        };
        log_info!("Video skipped for cycle {cycle}");
        self.locate_and_save(cycle, None).await
    }

    /// Survey answer plus clip plus save, in one call.
    pub async fn run_cycle(&self, sentiment: Sentiment) -> Result<i64, CollectError> {
        self.submit_survey(sentiment).await?;
        self.record_video().await
    }

    /// Back to the survey. A clip still recording for the old cycle is stopped.
    pub async fn reset(&self) -> CaptureState {
        let mut state = self.state.lock().await;
        state.reset();
        if let Some(stop) = self.cycle_stop.lock().await.take() {
            stop.cancel();
        }
        self.publish(&state)
    }

    pub fn set_daily_target(&self, target: u32) {
        self.daily_target.store(target, Ordering::Relaxed);
    }

    pub async fn todays_progress(&self) -> Result<DailyProgress, CollectError> {
        let count = self.db.count_today().await?;
        let target = self.daily_target.load(Ordering::Relaxed);
        Ok(DailyProgress {
            count,
            target,
            complete: count >= target as u64,
        })
    }

    async fn locate_and_save(
        &self,
        cycle: u64,
        video_path: Option<String>,
    ) -> Result<i64, CollectError> {
        let sentiment = {
            let mut state = self.state.lock().await;
            match state.begin_save(cycle, video_path.clone()) {
                Ok(sentiment) => {
                    self.publish(&state);
                    sentiment
                }
                Err(err) => {
                    log_warn!("Dropping capture for cycle {cycle}: {err}");
                    return Err(err);
                }
            }
        };

        let position = resolve_location(self.locator.as_ref(), &self.location).await;

        // Held through the insert so a concurrent reset cannot race the save.
        let mut state = self.state.lock().await;
        if state.cycle != cycle {
            log_warn!("Cycle {cycle} was reset during location lookup; nothing saved");
            return Err(CollectError::Discarded);
        }

        let result = match position {
            Ok(position) => self
                .db
                .create_record(NewRecord {
                    sentiment,
                    video_path,
                    latitude: position.latitude,
                    longitude: position.longitude,
                    timestamp: now_ms(),
                })
                .await
                .map_err(CollectError::from),
            Err(err) => Err(CollectError::LocationUnavailable(err)),
        };

        match &result {
            Ok(record_id) => {
                log_info!("Capture cycle {cycle} saved as record {record_id}");
                state.finish(cycle, CycleOutcome::Saved { record_id: *record_id });
            }
            Err(err) => {
                log_error!("Capture cycle {cycle} failed: {err}");
                state.finish(
                    cycle,
                    CycleOutcome::Failed {
                        message: err.to_string(),
                    },
                );
            }
        }
        self.publish(&state);

        result
    }

    fn publish(&self, state: &CaptureState) -> CaptureState {
        let snapshot = state.clone();
        self.events.send_replace(snapshot.clone());
        snapshot
    }
}

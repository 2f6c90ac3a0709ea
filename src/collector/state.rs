use serde::Serialize;

use crate::db::Sentiment;

use super::CollectError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum CaptureStep {
    Survey,
    #[serde(rename_all = "camelCase")]
    Video { sentiment: Sentiment },
    #[serde(rename_all = "camelCase")]
    LocationAndSave {
        sentiment: Sentiment,
        video_path: Option<String>,
    },
}

impl CaptureStep {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureStep::Survey => "survey",
            CaptureStep::Video { .. } => "video",
            CaptureStep::LocationAndSave { .. } => "locationAndSave",
        }
    }
}

/// How the last cycle ended. A cycle that ends always lands back on `Survey`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CycleOutcome {
    #[serde(rename_all = "camelCase")]
    Saved { record_id: i64 },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureState {
    pub step: CaptureStep,
    /// A capture or save for the current cycle is in flight.
    pub busy: bool,
    pub last_outcome: Option<CycleOutcome>,
    /// Bumped whenever a cycle ends or is reset; work tagged with an older
    /// value is discarded.
    #[serde(skip)]
    pub cycle: u64,
}

impl Default for CaptureState {
    fn default() -> Self {
        Self {
            step: CaptureStep::Survey,
            busy: false,
            last_outcome: None,
            cycle: 0,
        }
    }
}

impl CaptureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer_survey(&mut self, sentiment: Sentiment) -> Result<(), CollectError> {
        self.expect_idle("answer the survey")?;
        match self.step {
            CaptureStep::Survey => {
                self.step = CaptureStep::Video { sentiment };
                self.last_outcome = None;
                Ok(())
            }
            _ => Err(self.invalid("answer the survey")),
        }
    }

    /// Claim the current cycle for a capture. Returns the cycle tag.
    pub fn begin_capture(&mut self) -> Result<u64, CollectError> {
        self.expect_idle("record video")?;
        match self.step {
            CaptureStep::Video { .. } => {
                self.busy = true;
                Ok(self.cycle)
            }
            _ => Err(self.invalid("record video")),
        }
    }

    /// Capture failed: stay on `Video` so the user can try again.
    pub fn capture_failed(&mut self, cycle: u64) {
        if self.cycle == cycle {
            self.busy = false;
        }
    }

    pub fn begin_save(
        &mut self,
        cycle: u64,
        video_path: Option<String>,
    ) -> Result<Sentiment, CollectError> {
        if self.cycle != cycle {
            return Err(CollectError::Discarded);
        }
        match self.step {
            CaptureStep::Video { sentiment } => {
                self.step = CaptureStep::LocationAndSave {
                    sentiment,
                    video_path,
                };
                Ok(sentiment)
            }
            _ => Err(self.invalid("save")),
        }
    }

    /// End the cycle and go back to `Survey`. Ignored for stale cycles.
    pub fn finish(&mut self, cycle: u64, outcome: CycleOutcome) -> bool {
        if self.cycle != cycle {
            return false;
        }
        self.step = CaptureStep::Survey;
        self.busy = false;
        self.last_outcome = Some(outcome);
        self.cycle = self.cycle.wrapping_add(1);
        true
    }

    /// Drop in-progress answers and return to `Survey`.
    pub fn reset(&mut self) {
        if self.step == CaptureStep::Survey && !self.busy {
            return;
        }
        self.step = CaptureStep::Survey;
        self.busy = false;
        self.cycle = self.cycle.wrapping_add(1);
    }

    fn expect_idle(&self, action: &'static str) -> Result<(), CollectError> {
        if self.busy {
            Err(CollectError::Busy { action })
        } else {
            Ok(())
        }
    }

    fn invalid(&self, action: &'static str) -> CollectError {
        CollectError::InvalidTransition {
            action,
            step: self.step.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mood(value: i64) -> Sentiment {
        Sentiment::new(value).unwrap()
    }

    #[test]
    fn steps_advance_in_order() {
        let mut state = CaptureState::new();
        state.answer_survey(mood(4)).unwrap();
        assert_eq!(state.step, CaptureStep::Video { sentiment: mood(4) });

        let cycle = state.begin_capture().unwrap();
        assert!(state.busy);

        let sentiment = state.begin_save(cycle, Some("/tmp/a.mp4".into())).unwrap();
        assert_eq!(sentiment, mood(4));

        assert!(state.finish(cycle, CycleOutcome::Saved { record_id: 1 }));
        assert_eq!(state.step, CaptureStep::Survey);
        assert!(!state.busy);
        assert_eq!(state.last_outcome, Some(CycleOutcome::Saved { record_id: 1 }));
    }

    #[test]
    fn video_cannot_start_before_survey() {
        let mut state = CaptureState::new();
        assert!(matches!(
            state.begin_capture(),
            Err(CollectError::InvalidTransition { step: "survey", .. })
        ));
    }

    #[test]
    fn second_capture_while_busy_is_refused() {
        let mut state = CaptureState::new();
        state.answer_survey(mood(2)).unwrap();
        state.begin_capture().unwrap();
        assert!(matches!(state.begin_capture(), Err(CollectError::Busy { .. })));
    }

    #[test]
    fn reset_invalidates_in_flight_cycle() {
        let mut state = CaptureState::new();
        state.answer_survey(mood(5)).unwrap();
        let cycle = state.begin_capture().unwrap();

        state.reset();

        assert_eq!(state.step, CaptureStep::Survey);
        assert!(matches!(
            state.begin_save(cycle, None),
            Err(CollectError::Discarded)
        ));
        assert!(!state.finish(cycle, CycleOutcome::Saved { record_id: 9 }));
        assert_eq!(state.last_outcome, None);
    }

    #[test]
    fn failed_capture_stays_on_video() {
        let mut state = CaptureState::new();
        state.answer_survey(mood(3)).unwrap();
        let cycle = state.begin_capture().unwrap();

        state.capture_failed(cycle);

        assert_eq!(state.step, CaptureStep::Video { sentiment: mood(3) });
        assert!(!state.busy);
    }
}

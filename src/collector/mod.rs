pub mod commands;
pub mod controller;
pub mod state;
pub mod survey;

use thiserror::Error;

use crate::{capture::CaptureError, db::StoreError, location::LocationError};

pub use controller::{CaptureController, DailyProgress};
pub use state::{CaptureState, CaptureStep, CycleOutcome};
pub use survey::{Questionnaire, SurveyError, SENTIMENT_QUESTIONS};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("cannot {action} during the {step} step")]
    InvalidTransition {
        action: &'static str,
        step: &'static str,
    },
    #[error("cannot {action}: a capture cycle is already in progress")]
    Busy { action: &'static str },
    #[error("capture cycle was reset before it finished")]
    Discarded,
    #[error(transparent)]
    Survey(#[from] SurveyError),
    #[error(transparent)]
    CaptureFailed(#[from] CaptureError),
    #[error(transparent)]
    LocationUnavailable(#[from] LocationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

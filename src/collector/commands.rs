use crate::{
    collector::{
        survey::SurveyQuestion, CaptureState, CollectError, DailyProgress, SENTIMENT_QUESTIONS,
    },
    db::Sentiment,
    AppState,
};

/// Message shown to the user when a cycle step fails.
fn user_message(err: &CollectError) -> String {
    match err {
        CollectError::CaptureFailed(err) => format!("Recording failed: {err}"),
        CollectError::LocationUnavailable(_) => {
            "Could not determine your location. Please try again.".to_string()
        }
        CollectError::Store(err) => format!("Could not save the record: {err}"),
        other => other.to_string(),
    }
}

pub fn get_survey_questions() -> &'static [SurveyQuestion] {
    SENTIMENT_QUESTIONS
}

pub async fn get_capture_state(state: &AppState) -> Result<CaptureState, String> {
    Ok(state.collector.snapshot().await)
}

pub async fn submit_sentiment(state: &AppState, value: i64) -> Result<CaptureState, String> {
    let sentiment = Sentiment::new(value).map_err(|e| e.to_string())?;
    state
        .collector
        .submit_survey(sentiment)
        .await
        .map_err(|e| user_message(&e))
}

pub async fn record_video(state: &AppState) -> Result<i64, String> {
    state
        .collector
        .record_video()
        .await
        .map_err(|e| user_message(&e))
}

pub async fn skip_video(state: &AppState) -> Result<i64, String> {
    state
        .collector
        .skip_video()
        .await
        .map_err(|e| user_message(&e))
}

pub async fn reset_capture(state: &AppState) -> Result<CaptureState, String> {
    Ok(state.collector.reset().await)
}

pub async fn get_todays_progress(state: &AppState) -> Result<DailyProgress, String> {
    state
        .collector
        .todays_progress()
        .await
        .map_err(|e| e.to_string())
}

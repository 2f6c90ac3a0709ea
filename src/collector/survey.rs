use serde::Serialize;
use thiserror::Error;

use crate::db::Sentiment;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurveyError {
    #[error("{0} is not an option for this question")]
    InvalidOption(u8),
    #[error("questionnaire already answered")]
    AlreadyComplete,
    #[error("questionnaire has unanswered questions")]
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyOption {
    pub value: u8,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestion {
    pub id: u32,
    pub prompt: &'static str,
    pub options: &'static [SurveyOption],
}

const MOOD_OPTIONS: &[SurveyOption] = &[
    SurveyOption { value: 1, label: "Very bad" },
    SurveyOption { value: 2, label: "Bad" },
    SurveyOption { value: 3, label: "Neutral" },
    SurveyOption { value: 4, label: "Good" },
    SurveyOption { value: 5, label: "Very good" },
];

/// The mood instrument shown at every check-in.
pub const SENTIMENT_QUESTIONS: &[SurveyQuestion] = &[SurveyQuestion {
    id: 1,
    prompt: "How is your overall mood today?",
    options: MOOD_OPTIONS,
}];

/// Walks the user through a question list and reduces the answers to one score.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    questions: &'static [SurveyQuestion],
    /// One answer per question, in question order.
    answers: Vec<u8>,
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self::with_questions(SENTIMENT_QUESTIONS)
    }
}

impl Questionnaire {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_questions(questions: &'static [SurveyQuestion]) -> Self {
        Self {
            questions,
            answers: Vec::with_capacity(questions.len()),
        }
    }

    pub fn current_question(&self) -> Option<&SurveyQuestion> {
        self.questions.get(self.answers.len())
    }

    /// `(answered, total)` for the progress label.
    pub fn progress(&self) -> (usize, usize) {
        (self.answers.len(), self.questions.len())
    }

    /// Record an answer for the current question and advance.
    ///
    /// Returns the final score once the last question is answered.
    pub fn answer(&mut self, value: u8) -> Result<Option<Sentiment>, SurveyError> {
        let question = self
            .current_question()
            .ok_or(SurveyError::AlreadyComplete)?;
        if !question.options.iter().any(|option| option.value == value) {
            return Err(SurveyError::InvalidOption(value));
        }

        self.answers.push(value);

        if self.answers.len() < self.questions.len() {
            Ok(None)
        } else {
            self.score().map(Some)
        }
    }

    /// Mean of all answers, rounded half up.
    pub fn score(&self) -> Result<Sentiment, SurveyError> {
        if self.questions.is_empty() || self.answers.len() < self.questions.len() {
            return Err(SurveyError::Incomplete);
        }

        let total: i64 = self.answers.iter().map(|&v| v as i64).sum();
        let count = self.answers.len() as i64;
        let rounded = (2 * total + count) / (2 * count);

        Sentiment::new(rounded).map_err(|_| SurveyError::InvalidOption(rounded as u8))
    }
}

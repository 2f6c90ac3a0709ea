//! Collected record data models.
//!
//! - `DataRecord`, `NewRecord`: one completed capture cycle
//! - `Sentiment`: the validated 1–5 survey score
//! - `StoreStats`: aggregate view used by the settings screen

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::db::StoreError;

/// Survey score from 1 (very bad) to 5 (very good).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Sentiment(u8);

impl Sentiment {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, StoreError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(StoreError::InvalidSentiment(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "very bad",
            2 => "bad",
            3 => "neutral",
            4 => "good",
            _ => "very good",
        }
    }
}

impl TryFrom<i64> for Sentiment {
    type Error = StoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sentiment> for i64 {
    fn from(sentiment: Sentiment) -> Self {
        sentiment.0 as i64
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted capture: never updated in place, only created or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRecord {
    pub id: i64,
    pub sentiment: Sentiment,
    pub video_path: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch milliseconds, stamped by the capture controller at save time.
    pub timestamp: i64,
}

impl DataRecord {
    /// File name of the clip, taken from the last path segment.
    pub fn video_file_name(&self) -> Option<&str> {
        self.video_path
            .as_deref()
            .map(|path| path.rsplit('/').next().unwrap_or(path))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub sentiment: Sentiment,
    pub video_path: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_records: u64,
    pub last_record_time: Option<i64>,
}

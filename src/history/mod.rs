pub mod commands;

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::db::DataRecord;

/// One row of the history list, pre-formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub timestamp: i64,
    pub recorded_at: String,
    pub sentiment: u8,
    pub sentiment_label: &'static str,
    pub coordinates: String,
    pub video_path: Option<String>,
    pub video_file: Option<String>,
}

impl HistoryEntry {
    pub fn from_record_in<Tz: TimeZone>(record: &DataRecord, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let recorded_at = tz
            .timestamp_millis_opt(record.timestamp)
            .single()
            .map(|dt| dt.format("%Y/%m/%d %H:%M:%S").to_string())
            .unwrap_or_default();

        Self {
            id: record.id,
            timestamp: record.timestamp,
            recorded_at,
            sentiment: record.sentiment.value(),
            sentiment_label: record.sentiment.label(),
            coordinates: format!("{:.6}, {:.6}", record.latitude, record.longitude),
            video_path: record.video_path.clone(),
            video_file: record.video_file_name().map(String::from),
        }
    }
}

impl From<&DataRecord> for HistoryEntry {
    fn from(record: &DataRecord) -> Self {
        Self::from_record_in(record, &Local)
    }
}

use rusqlite::Row;

use crate::db::{models::DataRecord, Sentiment, StoreError};

/// SQLite's default bound-parameter ceiling is 32766; stay well below it.
pub const MAX_BOUND_IDS: usize = 500;

pub fn to_u64(value: i64, field: &str) -> Result<u64, StoreError> {
    u64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{field} contains negative value {value}")))
}

/// `?, ?, ?` for an `IN (...)` clause of `count` bound values.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub fn row_to_record(row: &Row) -> Result<DataRecord, StoreError> {
    let sentiment: i64 = row.get("sentiment").map_err(StoreError::Read)?;
    let sentiment = Sentiment::new(sentiment).map_err(|_| {
        StoreError::Corrupt(format!("sentiment {sentiment} is outside 1..=5"))
    })?;

    Ok(DataRecord {
        id: row.get("id").map_err(StoreError::Read)?,
        sentiment,
        video_path: row.get("video_path").map_err(StoreError::Read)?,
        latitude: row.get("latitude").map_err(StoreError::Read)?,
        longitude: row.get("longitude").map_err(StoreError::Read)?,
        timestamp: row.get("timestamp").map_err(StoreError::Read)?,
    })
}

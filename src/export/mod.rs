use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::{DataRecord, Database, StoreError};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub const CSV_HEADER: &str =
    "time,sentiment_score,sentiment_label,latitude,longitude,video_file,record_id";
pub const CSV_MIME: &str = "text/csv";
const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const NO_VIDEO: &str = "none";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("there are no records to export")]
    NothingToExport,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to write export file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("share sheet failed: {0}")]
    Share(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Unavailable,
}

/// Native share sheet.
#[async_trait]
pub trait ShareSink: Send + Sync {
    async fn share(
        &self,
        file: &Path,
        mime_type: &str,
        suggested_name: &str,
    ) -> Result<ShareOutcome, ExportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub file_path: PathBuf,
    pub record_count: usize,
    /// False when the platform has no share sheet; the file is still written.
    pub shared: bool,
}

/// CSV for `records`, timestamps rendered in the device's local time.
pub fn records_to_csv(records: &[DataRecord]) -> String {
    records_to_csv_in(records, &Local)
}

pub fn records_to_csv_in<Tz>(records: &[DataRecord], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for record in records {
        let fields = [
            format_timestamp(record.timestamp, tz),
            record.sentiment.to_string(),
            record.sentiment.label().to_string(),
            record.latitude.to_string(),
            record.longitude.to_string(),
            record.video_file_name().unwrap_or(NO_VIDEO).to_string(),
            record.id.to_string(),
        ];
        let row: Vec<String> = fields.iter().map(|field| quote(field)).collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn format_timestamp<Tz>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format(TIME_FORMAT).to_string(),
        None => timestamp_ms.to_string(),
    }
}

/// `sentiment_records_2024-03-01-09-30-00.csv`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("sentiment_records_{}.csv", now.format("%Y-%m-%d-%H-%M-%S"))
}

/// Write every stored record to `export_dir` and hand the file to the share sheet.
pub async fn export_records(
    db: &Database,
    sink: &dyn ShareSink,
    export_dir: &Path,
) -> Result<ExportReport, ExportError> {
    let records = db.list_records().await?;
    if records.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let csv = records_to_csv(&records);
    let file_name = export_file_name(Utc::now());
    let file_path = export_dir.join(&file_name);

    let io_err = |source| ExportError::Io {
        path: file_path.display().to_string(),
        source,
    };
    tokio::fs::create_dir_all(export_dir)
        .await
        .map_err(io_err)?;
    tokio::fs::write(&file_path, csv.as_bytes())
        .await
        .map_err(io_err)?;

    let outcome = sink.share(&file_path, CSV_MIME, &file_name).await?;
    log_info!(
        "Exported {} records to {} ({outcome:?})",
        records.len(),
        file_path.display()
    );

    Ok(ExportReport {
        record_count: records.len(),
        shared: outcome == ShareOutcome::Shared,
        file_path,
    })
}

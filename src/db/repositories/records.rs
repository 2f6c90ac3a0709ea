use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::db::{
    helpers::{placeholders, row_to_record, to_u64, MAX_BOUND_IDS},
    models::{DataRecord, NewRecord, StoreStats},
    Database, StoreError,
};
use crate::utils::time::today_bounds;

const ENABLE_LOGS: bool = true;

use crate::log_info;

impl Database {
    /// Insert one record and return its assigned id.
    pub async fn create_record(&self, record: NewRecord) -> Result<i64, StoreError> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO data_records (sentiment, video_path, latitude, longitude, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    i64::from(record.sentiment),
                    record.video_path,
                    record.latitude,
                    record.longitude,
                    record.timestamp,
                ],
            )
            .map_err(StoreError::Write)?;

            let id = conn.last_insert_rowid();
            log_info!("Saved data record {id}");
            Ok(id)
        })
        .await
    }

    /// All records, newest first. Ties on timestamp fall back to insertion order.
    pub async fn list_records(&self) -> Result<Vec<DataRecord>, StoreError> {
        self.execute(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, sentiment, video_path, latitude, longitude, timestamp
                     FROM data_records
                     ORDER BY timestamp DESC, id DESC",
                )
                .map_err(StoreError::Read)?;

            let mut rows = stmt.query([]).map_err(StoreError::Read)?;
            let mut records = Vec::new();
            while let Some(row) = rows.next().map_err(StoreError::Read)? {
                records.push(row_to_record(row)?);
            }

            Ok(records)
        })
        .await
    }

    pub async fn get_record(&self, id: i64) -> Result<Option<DataRecord>, StoreError> {
        self.execute(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, sentiment, video_path, latitude, longitude, timestamp
                     FROM data_records
                     WHERE id = ?1",
                )
                .map_err(StoreError::Read)?;

            let mut rows = stmt.query(params![id]).map_err(StoreError::Read)?;
            let record = match rows.next().map_err(StoreError::Read)? {
                Some(row) => Some(row_to_record(row)?),
                None => None,
            };
            Ok(record)
        })
        .await
    }

    /// Number of records with `start <= timestamp <= end`.
    pub async fn count_in_range(&self, start: i64, end: i64) -> Result<u64, StoreError> {
        self.execute(move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM data_records WHERE timestamp BETWEEN ?1 AND ?2",
                    params![start, end],
                    |row| row.get(0),
                )
                .map_err(StoreError::Read)?;
            to_u64(count, "count")
        })
        .await
    }

    /// Records collected during today's local calendar day.
    pub async fn count_today(&self) -> Result<u64, StoreError> {
        let (start, end) = today_bounds();
        self.count_in_range(start, end).await
    }

    /// Delete one record. Unknown ids are a no-op.
    pub async fn delete_record(&self, id: i64) -> Result<usize, StoreError> {
        self.execute(move |conn| {
            let removed = conn
                .execute("DELETE FROM data_records WHERE id = ?1", params![id])
                .map_err(StoreError::Write)?;
            log_info!("Deleted data record {id} ({removed} row)");
            Ok(removed)
        })
        .await
    }

    /// Delete every listed record in one transaction. Unknown ids are ignored.
    pub async fn delete_records(&self, ids: &[i64]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        self.execute(move |conn| {
            let tx = conn.transaction().map_err(StoreError::Write)?;

            let mut removed = 0;
            for chunk in ids.chunks(MAX_BOUND_IDS) {
                let sql = format!(
                    "DELETE FROM data_records WHERE id IN ({})",
                    placeholders(chunk.len())
                );
                removed += tx
                    .execute(&sql, params_from_iter(chunk.iter()))
                    .map_err(StoreError::Write)?;
            }

            tx.commit().map_err(StoreError::Write)?;
            log_info!("Deleted {removed} data records");
            Ok(removed)
        })
        .await
    }

    pub async fn delete_all_records(&self) -> Result<usize, StoreError> {
        self.execute(|conn| {
            let removed = conn
                .execute("DELETE FROM data_records", [])
                .map_err(StoreError::Write)?;
            log_info!("Deleted all {removed} data records");
            Ok(removed)
        })
        .await
    }

    pub async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.execute(|conn| {
            let total: i64 = conn
                .query_row("SELECT COUNT(*) FROM data_records", [], |row| row.get(0))
                .map_err(StoreError::Read)?;

            let last_record_time: Option<i64> = conn
                .query_row(
                    "SELECT timestamp FROM data_records ORDER BY timestamp DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::Read)?;

            Ok(StoreStats {
                total_records: to_u64(total, "total_records")?,
                last_record_time,
            })
        })
        .await
    }
}

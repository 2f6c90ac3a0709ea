use rusqlite::Connection;
use thiserror::Error;

const RECORD_COLUMNS: [&str; 6] = [
    "id",
    "sentiment",
    "video_path",
    "latitude",
    "longitude",
    "timestamp",
];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to create records table: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("existing data_records table is missing columns: {}", .0.join(", "))]
    Mismatch(Vec<&'static str>),
}

/// Create the records table if absent, then check that a pre-existing one
/// has the same shape.
pub fn ensure_schema(conn: &mut Connection) -> Result<(), SchemaError> {
    conn.execute_batch(include_str!("schemas/records.sql"))?;

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('data_records')")?;
    let existing = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let missing: Vec<&'static str> = RECORD_COLUMNS
        .iter()
        .copied()
        .filter(|column| !existing.iter().any(|name| name.eq_ignore_ascii_case(column)))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Mismatch(missing))
    }
}

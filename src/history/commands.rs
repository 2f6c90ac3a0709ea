use crate::{
    export::{export_records as write_export, ExportError, ExportReport},
    history::HistoryEntry,
    location::{address_for, Address, Position},
    AppState,
};

pub async fn list_records(state: &AppState) -> Result<Vec<HistoryEntry>, String> {
    let records = state
        .db
        .list_records()
        .await
        .map_err(|_| "Could not load history".to_string())?;
    Ok(records.iter().map(HistoryEntry::from).collect())
}

pub async fn delete_record(state: &AppState, id: i64) -> Result<usize, String> {
    state
        .db
        .delete_record(id)
        .await
        .map_err(|e| format!("Delete failed: {e}"))
}

pub async fn delete_records(state: &AppState, ids: Vec<i64>) -> Result<usize, String> {
    state
        .db
        .delete_records(&ids)
        .await
        .map_err(|e| format!("Delete failed: {e}"))
}

pub async fn delete_all_records(state: &AppState) -> Result<usize, String> {
    state
        .db
        .delete_all_records()
        .await
        .map_err(|e| format!("Failed to delete all records: {e}"))
}

pub async fn export_records(state: &AppState) -> Result<ExportReport, String> {
    write_export(&state.db, state.share.as_ref(), &state.config.export_dir())
        .await
        .map_err(|e| match e {
            ExportError::NothingToExport => "There is no data to export".to_string(),
            other => format!("Export failed: {other}"),
        })
}

/// Street address for a record's coordinates, when the platform can tell.
pub async fn get_record_address(state: &AppState, id: i64) -> Result<Option<Address>, String> {
    let record = state
        .db
        .get_record(id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Record {id} not found"))?;

    let position = Position {
        latitude: record.latitude,
        longitude: record.longitude,
        accuracy: None,
        timestamp: record.timestamp,
    };
    Ok(address_for(state.locator.as_ref(), &position).await)
}

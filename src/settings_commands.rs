//! Commands behind the settings screen: stats, reminders and the daily target.

use serde::Serialize;

use crate::{
    notifications::ScheduledNotification, settings::ReminderSettings, AppState,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub total_records: u64,
    pub todays_records: u64,
    pub last_record_time: Option<i64>,
    pub scheduled_notifications: usize,
    pub daily_target: u32,
}

pub async fn get_daily_stats(state: &AppState) -> Result<DailyStats, String> {
    let stats = state.db.stats().await.map_err(|e| e.to_string())?;
    let todays_records = state.db.count_today().await.map_err(|e| e.to_string())?;
    let scheduled = state.reminders.scheduled().await;

    Ok(DailyStats {
        total_records: stats.total_records,
        todays_records,
        last_record_time: stats.last_record_time,
        scheduled_notifications: scheduled.len(),
        daily_target: state.settings.daily_target(),
    })
}

pub async fn get_scheduled_notifications(
    state: &AppState,
) -> Result<Vec<ScheduledNotification>, String> {
    Ok(state.reminders.scheduled().await)
}

/// Drop every pending reminder and schedule the configured set again.
pub async fn reset_notifications(state: &AppState) -> Result<(), String> {
    state
        .reminders
        .reschedule()
        .await
        .map_err(|e| e.to_string())
}

pub async fn send_test_notification(state: &AppState) -> Result<(), String> {
    state
        .reminders
        .send_test()
        .await
        .map_err(|e| e.to_string())
}

pub fn get_reminder_settings(state: &AppState) -> Result<ReminderSettings, String> {
    Ok(state.settings.reminders())
}

/// The flag is only saved once the scheduler has accepted the change.
pub async fn set_reminders_enabled(state: &AppState, enabled: bool) -> Result<(), String> {
    if enabled {
        state
            .reminders
            .ensure_permission()
            .await
            .map_err(|e| e.to_string())?;
        state
            .reminders
            .reschedule()
            .await
            .map_err(|e| e.to_string())?;
    } else {
        state
            .reminders
            .cancel_all()
            .await
            .map_err(|e| e.to_string())?;
    }

    state
        .settings
        .set_reminders_enabled(enabled)
        .map_err(|e| e.to_string())
}

pub fn set_daily_target(state: &AppState, target: u32) -> Result<u32, String> {
    state
        .settings
        .set_daily_target(target)
        .map_err(|e| e.to_string())?;

    let target = state.settings.daily_target();
    state.collector.set_daily_target(target);
    Ok(target)
}

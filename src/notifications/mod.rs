//! Daily reminder policy over the platform notification scheduler.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::PermissionStatus;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const REMINDER_TITLE: &str = "Daily check-in";
pub const REMINDER_BODY: &str =
    "Time to collect today's data: a mood survey, a short clip and your location.";
pub const REMINDER_ACTION: &str = "collect_data";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification permission denied")]
    PermissionDenied,
    #[error("notification scheduler failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderTime {
    pub hour: u8,
    pub minute: u8,
    pub id: String,
}

impl ReminderTime {
    pub fn new(hour: u8, minute: u8, id: impl Into<String>) -> Self {
        Self {
            hour,
            minute,
            id: id.into(),
        }
    }

    /// `9:00`, `14:00`, ...
    pub fn label(&self) -> String {
        format!("{}:{:02}", self.hour, self.minute)
    }
}

/// The three fixed check-ins: 09:00, 14:00 and 20:00.
pub fn default_reminder_times() -> Vec<ReminderTime> {
    vec![
        ReminderTime::new(9, 0, "morning-reminder"),
        ReminderTime::new(14, 0, "afternoon-reminder"),
        ReminderTime::new(20, 0, "evening-reminder"),
    ]
}

/// One repeating daily trigger handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReminder {
    pub id: String,
    pub hour: u8,
    pub minute: u8,
    pub title: String,
    pub body: String,
    pub action: String,
    pub time_label: String,
}

impl From<&ReminderTime> for DailyReminder {
    fn from(time: &ReminderTime) -> Self {
        Self {
            id: time.id.clone(),
            hour: time.hour,
            minute: time.minute,
            title: REMINDER_TITLE.into(),
            body: REMINDER_BODY.into(),
            action: REMINDER_ACTION.into(),
            time_label: time.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotification {
    pub id: String,
    pub title: String,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
}

/// Platform local-notification capability.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    async fn permission_status(&self) -> Result<PermissionStatus, NotificationError>;

    async fn request_permission(&self) -> Result<PermissionStatus, NotificationError>;

    async fn cancel_all(&self) -> Result<(), NotificationError>;

    async fn schedule_daily(&self, reminders: &[DailyReminder]) -> Result<(), NotificationError>;

    async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, NotificationError>;

    async fn send_immediate(&self, title: &str, body: &str) -> Result<(), NotificationError>;
}

#[derive(Clone)]
pub struct ReminderScheduler {
    backend: Arc<dyn NotificationBackend>,
    times: Vec<ReminderTime>,
}

impl ReminderScheduler {
    pub fn new(backend: Arc<dyn NotificationBackend>, times: Vec<ReminderTime>) -> Self {
        Self { backend, times }
    }

    pub fn times(&self) -> &[ReminderTime] {
        &self.times
    }

    /// Ask for permission unless it is already granted.
    pub async fn ensure_permission(&self) -> Result<(), NotificationError> {
        let mut status = self.backend.permission_status().await?;
        if status != PermissionStatus::Granted {
            status = self.backend.request_permission().await?;
        }

        if status == PermissionStatus::Granted {
            Ok(())
        } else {
            log_warn!("Notification permission refused ({status:?})");
            Err(NotificationError::PermissionDenied)
        }
    }

    /// Replace every scheduled reminder with the configured set.
    pub async fn reschedule(&self) -> Result<(), NotificationError> {
        self.backend.cancel_all().await?;

        let reminders: Vec<DailyReminder> = self.times.iter().map(DailyReminder::from).collect();
        self.backend.schedule_daily(&reminders).await?;

        log_info!("Scheduled {} daily reminders", reminders.len());
        Ok(())
    }

    /// Currently scheduled reminders; a failing backend reads as none.
    pub async fn scheduled(&self) -> Vec<ScheduledNotification> {
        match self.backend.list_scheduled().await {
            Ok(scheduled) => scheduled,
            Err(err) => {
                log_warn!("Failed to list scheduled notifications: {err}");
                Vec::new()
            }
        }
    }

    pub async fn cancel_all(&self) -> Result<(), NotificationError> {
        self.backend.cancel_all().await?;
        log_info!("Cancelled all notifications");
        Ok(())
    }

    pub async fn send_test(&self) -> Result<(), NotificationError> {
        self.backend
            .send_immediate("Test notification", "This is a test notification")
            .await
    }
}

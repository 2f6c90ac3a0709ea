use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::notifications::{default_reminder_times, ReminderTime};

/// Reminder view for the settings screen. Only `enabled` is persisted; the
/// trigger times are always the fixed daily set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSettings {
    pub enabled: bool,
    pub times: Vec<ReminderTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    reminders_enabled: bool,
    daily_target: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            reminders_enabled: true,
            daily_target: 3,
        }
    }
}

/// User-editable preferences persisted as JSON next to the database.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            let mut data: UserSettings = serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            });
            data.daily_target = data.daily_target.max(1);
            data
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn reminders(&self) -> ReminderSettings {
        ReminderSettings {
            enabled: self.read().reminders_enabled,
            times: default_reminder_times(),
        }
    }

    pub fn daily_target(&self) -> u32 {
        self.read().daily_target
    }

    pub fn set_reminders_enabled(&self, enabled: bool) -> Result<()> {
        let mut guard = self.write();
        guard.reminders_enabled = enabled;
        self.persist(&guard)
    }

    pub fn set_daily_target(&self, target: u32) -> Result<()> {
        let mut guard = self.write();
        guard.daily_target = target.max(1);
        self.persist(&guard)
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_three_daily_reminders() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();

        assert_eq!(store.daily_target(), 3);
        let reminders = store.reminders();
        assert!(reminders.enabled);
        assert_eq!(reminders.times.len(), 3);
    }

    #[test]
    fn changes_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        store.set_reminders_enabled(false).unwrap();
        store.set_daily_target(5).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert!(!reloaded.reminders().enabled);
        assert_eq!(reloaded.daily_target(), 5);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.daily_target(), 3);
    }

    #[test]
    fn reminder_times_in_the_file_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
                "remindersEnabled": false,
                "dailyTarget": 0,
                "times": [{"hour": 99, "minute": 75, "id": "bogus"}]
            }"#,
        )
        .unwrap();

        let store = SettingsStore::new(path).unwrap();
        let reminders = store.reminders();
        assert!(!reminders.enabled);
        assert_eq!(reminders.times, default_reminder_times());
        assert_eq!(store.daily_target(), 1);
    }
}

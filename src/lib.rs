pub mod capture;
pub mod collector;
pub mod config;
pub mod db;
pub mod export;
pub mod history;
pub mod location;
pub mod notifications;
pub mod settings;
pub mod settings_commands;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;
use capture::VideoRecorder;
use collector::CaptureController;
use config::AppConfig;
use db::Database;
use export::ShareSink;
use location::LocationProvider;
use notifications::{NotificationBackend, NotificationError, ReminderScheduler};
use settings::SettingsStore;

/// Device capabilities supplied by the host shell.
pub struct Platform {
    pub recorder: Arc<dyn VideoRecorder>,
    pub locator: Arc<dyn LocationProvider>,
    pub notifier: Arc<dyn NotificationBackend>,
    pub share: Arc<dyn ShareSink>,
}

pub struct AppState {
    pub db: Database,
    pub collector: CaptureController,
    pub reminders: ReminderScheduler,
    pub settings: SettingsStore,
    pub(crate) share: Arc<dyn ShareSink>,
    pub(crate) locator: Arc<dyn LocationProvider>,
    pub config: AppConfig,
}

impl AppState {
    /// Open the record store, load settings and schedule the daily reminders.
    pub async fn bootstrap(config: AppConfig, platform: Platform) -> anyhow::Result<Self> {
        std::fs::create_dir_all(config.data_dir()).with_context(|| {
            format!("Failed to create data dir {}", config.data_dir().display())
        })?;

        let database = Database::new(config.db_path());
        database
            .initialize()
            .await
            .context("Failed to initialize record store")?;

        let settings = SettingsStore::new(config.settings_path())?;
        let reminder_settings = settings.reminders();
        let reminders = ReminderScheduler::new(platform.notifier, reminder_settings.times);

        if reminder_settings.enabled {
            match reminders.ensure_permission().await {
                Ok(()) => reminders
                    .reschedule()
                    .await
                    .context("Failed to schedule daily reminders")?,
                Err(NotificationError::PermissionDenied) => {
                    log::warn!("Notifications not permitted; daily reminders are off");
                }
                Err(err) => {
                    return Err(err).context("Failed to check notification permission");
                }
            }
        }

        let collector = CaptureController::new(
            database.clone(),
            platform.recorder,
            platform.locator.clone(),
            config.capture,
            config.location,
            settings.daily_target(),
        );

        Ok(Self {
            db: database,
            collector,
            reminders,
            settings,
            share: platform.share,
            locator: platform.locator,
            config,
        })
    }

    pub fn shutdown(&self) {
        self.db.close();
    }
}

/// Initialize logging and build the application state.
pub async fn start(config: AppConfig, platform: Platform) -> anyhow::Result<AppState> {
    utils::logging::init_logging(config.log_level());

    log::info!("DailyLog starting up (data dir {})...", config.data_dir().display());

    AppState::bootstrap(config, platform).await
}

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use dailylog_lib::{
    capture::{CaptureError, VideoRecorder},
    collector::{self, CaptureStep, CollectError, CycleOutcome},
    config::AppConfig,
    db::{Database, Sentiment, StoreError},
    export::{ExportError, ShareOutcome, ShareSink, CSV_HEADER, CSV_MIME},
    history,
    location::{AccuracyTier, LocationError, LocationProvider, PermissionStatus, Position},
    notifications::{
        DailyReminder, NotificationBackend, NotificationError, ScheduledNotification,
    },
    settings::SettingsStore,
    settings_commands, AppState, Platform,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct FakeRecorder(&'static str);

#[async_trait]
impl VideoRecorder for FakeRecorder {
    async fn record(
        &self,
        _max_duration: Duration,
        _stop: CancellationToken,
    ) -> Result<String, CaptureError> {
        Ok(self.0.to_string())
    }
}

struct FakeLocator {
    fix: Option<(f64, f64)>,
    attempts: Mutex<Vec<AccuracyTier>>,
}

impl FakeLocator {
    fn new(fix: Option<(f64, f64)>) -> Self {
        Self {
            fix,
            attempts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LocationProvider for FakeLocator {
    async fn check_permission(&self) -> Result<PermissionStatus, LocationError> {
        Ok(PermissionStatus::Granted)
    }

    async fn request_permission(&self) -> Result<PermissionStatus, LocationError> {
        Ok(PermissionStatus::Granted)
    }

    async fn get_current_position(
        &self,
        tier: AccuracyTier,
        _timeout: Duration,
    ) -> Result<Position, LocationError> {
        self.attempts.lock().unwrap().push(tier);
        self.fix
            .map(|(latitude, longitude)| Position {
                latitude,
                longitude,
                accuracy: Some(12.0),
                timestamp: 0,
            })
            .ok_or_else(|| LocationError::Provider("no satellites".into()))
    }
}

#[derive(Default)]
struct FakeNotifier {
    denied: bool,
    scheduled: Mutex<Vec<DailyReminder>>,
}

#[async_trait]
impl NotificationBackend for FakeNotifier {
    async fn permission_status(&self) -> Result<PermissionStatus, NotificationError> {
        Ok(if self.denied {
            PermissionStatus::Denied
        } else {
            PermissionStatus::Granted
        })
    }

    async fn request_permission(&self) -> Result<PermissionStatus, NotificationError> {
        self.permission_status().await
    }

    async fn cancel_all(&self) -> Result<(), NotificationError> {
        self.scheduled.lock().unwrap().clear();
        Ok(())
    }

    async fn schedule_daily(&self, reminders: &[DailyReminder]) -> Result<(), NotificationError> {
        self.scheduled.lock().unwrap().extend_from_slice(reminders);
        Ok(())
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, NotificationError> {
        Ok(self
            .scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|r| ScheduledNotification {
                id: r.id.clone(),
                title: r.title.clone(),
                hour: Some(r.hour),
                minute: Some(r.minute),
            })
            .collect())
    }

    async fn send_immediate(&self, _title: &str, _body: &str) -> Result<(), NotificationError> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeShare {
    shared: Mutex<Vec<(PathBuf, String)>>,
}

#[async_trait]
impl ShareSink for FakeShare {
    async fn share(
        &self,
        file: &Path,
        mime_type: &str,
        _suggested_name: &str,
    ) -> Result<ShareOutcome, ExportError> {
        self.shared
            .lock()
            .unwrap()
            .push((file.to_path_buf(), mime_type.to_string()));
        Ok(ShareOutcome::Shared)
    }
}

struct Harness {
    _dir: TempDir,
    app: AppState,
    locator: Arc<FakeLocator>,
    notifier: Arc<FakeNotifier>,
    share: Arc<FakeShare>,
}

async fn harness(fix: Option<(f64, f64)>, notifier: FakeNotifier) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let locator = Arc::new(FakeLocator::new(fix));
    let notifier = Arc::new(notifier);
    let share = Arc::new(FakeShare::default());

    let app = AppState::bootstrap(
        AppConfig::new(dir.path().join("data")),
        Platform {
            recorder: Arc::new(FakeRecorder("/tmp/a.mp4")),
            locator: locator.clone(),
            notifier: notifier.clone(),
            share: share.clone(),
        },
    )
    .await
    .unwrap();

    Harness {
        _dir: dir,
        app,
        locator,
        notifier,
        share,
    }
}

#[tokio::test]
async fn full_cycle_saves_one_record() {
    let h = harness(Some((25.03, 121.56)), FakeNotifier::default()).await;
    let before = chrono::Utc::now().timestamp_millis();

    collector::commands::submit_sentiment(&h.app, 4).await.unwrap();
    let id = collector::commands::record_video(&h.app).await.unwrap();

    let records = h.app.db.list_records().await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, id);
    assert_eq!(record.sentiment, Sentiment::new(4).unwrap());
    assert_eq!(record.video_path.as_deref(), Some("/tmp/a.mp4"));
    assert_eq!((record.latitude, record.longitude), (25.03, 121.56));
    assert!(record.timestamp >= before);
    assert!(record.timestamp - before < 5_000);

    let state = h.app.collector.snapshot().await;
    assert_eq!(state.step, CaptureStep::Survey);
    assert_eq!(state.last_outcome, Some(CycleOutcome::Saved { record_id: id }));
    assert_eq!(*h.locator.attempts.lock().unwrap(), vec![AccuracyTier::High]);
}

#[tokio::test]
async fn location_failure_saves_nothing() {
    let h = harness(None, FakeNotifier::default()).await;

    h.app
        .collector
        .submit_survey(Sentiment::new(2).unwrap())
        .await
        .unwrap();
    let err = h.app.collector.record_video().await.unwrap_err();

    assert!(matches!(err, CollectError::LocationUnavailable(_)));
    assert!(h.app.db.list_records().await.unwrap().is_empty());
    assert_eq!(h.app.collector.snapshot().await.step, CaptureStep::Survey);
    assert_eq!(
        *h.locator.attempts.lock().unwrap(),
        vec![AccuracyTier::High, AccuracyTier::Low]
    );
}

#[tokio::test]
async fn failed_save_returns_to_survey_without_a_row() {
    let h = harness(Some((25.03, 121.56)), FakeNotifier::default()).await;

    h.app
        .collector
        .submit_survey(Sentiment::new(3).unwrap())
        .await
        .unwrap();
    h.app.db.close();
    let err = h.app.collector.record_video().await.unwrap_err();

    assert!(matches!(err, CollectError::Store(StoreError::NotInitialized)));
    let state = h.app.collector.snapshot().await;
    assert_eq!(state.step, CaptureStep::Survey);
    assert!(!state.busy);
    assert!(matches!(
        state.last_outcome,
        Some(CycleOutcome::Failed { .. })
    ));

    h.app.db.initialize().await.unwrap();
    assert!(h.app.db.list_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_sentiment_is_rejected() {
    let h = harness(Some((1.0, 1.0)), FakeNotifier::default()).await;

    assert!(collector::commands::submit_sentiment(&h.app, 6).await.is_err());
    assert!(collector::commands::submit_sentiment(&h.app, 0).await.is_err());
    assert_eq!(h.app.collector.snapshot().await.step, CaptureStep::Survey);
}

#[tokio::test]
async fn store_rejects_use_before_initialize() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("store.sqlite3"));

    assert!(matches!(
        db.list_records().await,
        Err(StoreError::NotInitialized)
    ));

    db.initialize().await.unwrap();
    db.initialize().await.unwrap();
    assert!(db.list_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn bootstrap_schedules_three_reminders() {
    let h = harness(Some((1.0, 1.0)), FakeNotifier::default()).await;

    let labels: Vec<String> = h
        .notifier
        .scheduled
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.time_label.clone())
        .collect();
    assert_eq!(labels, vec!["9:00", "14:00", "20:00"]);

    settings_commands::reset_notifications(&h.app).await.unwrap();
    let stats = settings_commands::get_daily_stats(&h.app).await.unwrap();
    assert_eq!(stats.scheduled_notifications, 3);
    assert_eq!(stats.total_records, 0);
    assert_eq!(stats.last_record_time, None);
}

#[tokio::test]
async fn denied_notifications_do_not_block_startup() {
    let h = harness(
        Some((1.0, 1.0)),
        FakeNotifier {
            denied: true,
            ..FakeNotifier::default()
        },
    )
    .await;

    assert!(h.notifier.scheduled.lock().unwrap().is_empty());
    assert!(h.app.db.is_initialized());
}

#[tokio::test]
async fn refused_permission_keeps_reminders_off() {
    let h = harness(
        Some((1.0, 1.0)),
        FakeNotifier {
            denied: true,
            ..FakeNotifier::default()
        },
    )
    .await;

    settings_commands::set_reminders_enabled(&h.app, false)
        .await
        .unwrap();
    let err = settings_commands::set_reminders_enabled(&h.app, true)
        .await
        .unwrap_err();

    assert_eq!(err, "notification permission denied");
    assert!(!h.app.settings.reminders().enabled);
    let reloaded = SettingsStore::new(h.app.config.settings_path()).unwrap();
    assert!(!reloaded.reminders().enabled);
    assert!(h.notifier.scheduled.lock().unwrap().is_empty());
}

#[tokio::test]
async fn export_writes_csv_and_shares_it() {
    let h = harness(Some((25.03, 121.56)), FakeNotifier::default()).await;

    let err = history::commands::export_records(&h.app).await.unwrap_err();
    assert_eq!(err, "There is no data to export");
    assert!(h.share.shared.lock().unwrap().is_empty());

    h.app
        .collector
        .run_cycle(Sentiment::new(5).unwrap())
        .await
        .unwrap();
    let report = history::commands::export_records(&h.app).await.unwrap();

    assert_eq!(report.record_count, 1);
    assert!(report.shared);
    let contents = std::fs::read_to_string(&report.file_path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    let row = lines.next().unwrap();
    assert!(row.contains("\"5\",\"very good\",\"25.03\",\"121.56\",\"a.mp4\""));

    let shared = h.share.shared.lock().unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0], (report.file_path.clone(), CSV_MIME.to_string()));
}

#[tokio::test]
async fn daily_target_change_reaches_progress() {
    let h = harness(Some((1.0, 1.0)), FakeNotifier::default()).await;
    h.app
        .collector
        .run_cycle(Sentiment::new(3).unwrap())
        .await
        .unwrap();

    assert_eq!(settings_commands::set_daily_target(&h.app, 1).unwrap(), 1);
    let progress = collector::commands::get_todays_progress(&h.app).await.unwrap();
    assert_eq!(progress.count, 1);
    assert_eq!(progress.target, 1);
    assert!(progress.complete);

    let entries = history::commands::list_records(&h.app).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].coordinates, "1.000000, 1.000000");

    history::commands::delete_all_records(&h.app).await.unwrap();
    assert!(history::commands::list_records(&h.app).await.unwrap().is_empty());
}

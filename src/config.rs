use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::{capture::CaptureConfig, location::LocationPolicy};

pub const DATA_DIR_ENV: &str = "DAILYLOG_DATA_DIR";
pub const DEBUG_ENV: &str = "DAILYLOG_DEBUG";

/// Startup configuration supplied by the host shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub data_dir: PathBuf,
    #[serde(default = "default_db_file")]
    pub db_file: String,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub location: LocationPolicy,
    #[serde(default)]
    pub debug: bool,
}

fn default_db_file() -> String {
    "dailyData.sqlite3".into()
}

impl AppConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            db_file: default_db_file(),
            capture: CaptureConfig::default(),
            location: LocationPolicy::default(),
            debug: false,
        }
    }

    /// `new(default_data_dir)` with `DAILYLOG_DATA_DIR` and `DAILYLOG_DEBUG` applied.
    pub fn from_env(default_data_dir: impl Into<PathBuf>) -> Self {
        let mut config = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::new(dir),
            _ => Self::new(default_data_dir),
        };
        config.debug = std::env::var(DEBUG_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

//! Coordinate resolution on top of the platform location provider.
//!
//! The provider is reached through [`LocationProvider`]; this module owns the
//! two-tier accuracy fallback used when a capture cycle saves its record.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccuracyTier {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, when the provider reports one.
    pub accuracy: Option<f64>,
    /// Epoch milliseconds of the fix.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("{tier:?} accuracy fix timed out after {timeout:?}")]
    Timeout { tier: AccuracyTier, timeout: Duration },
    #[error("location provider failed: {0}")]
    Provider(String),
    #[error("location unavailable: high accuracy ({high}); low accuracy ({low})")]
    Unavailable {
        high: Box<LocationError>,
        low: Box<LocationError>,
    },
}

/// Platform geolocation capability.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn check_permission(&self) -> Result<PermissionStatus, LocationError>;

    async fn request_permission(&self) -> Result<PermissionStatus, LocationError>;

    async fn get_current_position(
        &self,
        tier: AccuracyTier,
        timeout: Duration,
    ) -> Result<Position, LocationError>;

    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<Address>, LocationError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPolicy {
    #[serde(with = "millis")]
    pub high_accuracy_timeout: Duration,
    #[serde(with = "millis")]
    pub low_accuracy_timeout: Duration,
}

impl Default for LocationPolicy {
    fn default() -> Self {
        Self {
            high_accuracy_timeout: Duration::from_secs(10),
            low_accuracy_timeout: Duration::from_secs(5),
        }
    }
}

/// Resolve a fix: high accuracy first, low accuracy on any failure.
///
/// Permission is requested up front; a refusal counts as a failed high-tier
/// attempt so the coarse fix still gets its chance.
pub async fn resolve_location(
    provider: &dyn LocationProvider,
    policy: &LocationPolicy,
) -> Result<Position, LocationError> {
    let high = match provider.request_permission().await {
        Ok(PermissionStatus::Granted) => {
            attempt(provider, AccuracyTier::High, policy.high_accuracy_timeout).await
        }
        Ok(_) => Err(LocationError::PermissionDenied),
        Err(err) => Err(err),
    };

    let high_err = match high {
        Ok(position) => return Ok(position),
        Err(err) => err,
    };
    log_warn!("High accuracy location failed: {high_err}; falling back to low accuracy");

    match attempt(provider, AccuracyTier::Low, policy.low_accuracy_timeout).await {
        Ok(position) => Ok(position),
        Err(low_err) => {
            log_error!("Low accuracy location also failed: {low_err}");
            Err(LocationError::Unavailable {
                high: Box::new(high_err),
                low: Box::new(low_err),
            })
        }
    }
}

async fn attempt(
    provider: &dyn LocationProvider,
    tier: AccuracyTier,
    timeout: Duration,
) -> Result<Position, LocationError> {
    match time::timeout(timeout, provider.get_current_position(tier, timeout)).await {
        Ok(result) => {
            if let Ok(position) = &result {
                log_info!(
                    "Resolved {tier:?} fix {:.6}, {:.6}",
                    position.latitude,
                    position.longitude
                );
            }
            result
        }
        Err(_) => Err(LocationError::Timeout { tier, timeout }),
    }
}

/// Best-effort address lookup; failures are logged and read as "no address".
pub async fn address_for(provider: &dyn LocationProvider, position: &Position) -> Option<Address> {
    match provider
        .reverse_geocode(position.latitude, position.longitude)
        .await
    {
        Ok(address) => address,
        Err(err) => {
            log_warn!("Reverse geocoding failed: {err}");
            None
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

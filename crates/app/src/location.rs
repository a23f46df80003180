use std::fmt;
use std::sync::RwLock;

use mood_core::state::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("location is not available on this host")]
    Unsupported,
    #[error("invalid coordinates: {latitude}, {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Unsupported,
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionState::Granted => "granted",
            PermissionState::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GeoPosition {
    /// Rejects non-finite values, |lat| > 90 and |lon| > 180.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && latitude.abs() <= 90.0
            && longitude.abs() <= 180.0;
        if !valid {
            return Err(LocationError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
            label: None,
        })
    }
}

impl Default for GeoPosition {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            label: Some("Córdoba, AR".to_string()),
        }
    }
}

/// Source of the device position.
pub trait LocationProvider: Send + Sync {
    fn request_location(&self) -> Result<GeoPosition, LocationError>;

    fn permission_state(&self) -> PermissionState;
}

/// Position supplied by configuration or by a client.
///
/// A disabled provider reports [`PermissionState::Unsupported`] until a
/// client sets a position by hand.
#[derive(Debug)]
pub struct ManualLocation {
    position: RwLock<Option<GeoPosition>>,
}

impl Default for ManualLocation {
    fn default() -> Self {
        Self::new(GeoPosition::default())
    }
}

impl ManualLocation {
    pub fn new(position: GeoPosition) -> Self {
        Self {
            position: RwLock::new(Some(position)),
        }
    }

    pub fn disabled() -> Self {
        Self {
            position: RwLock::new(None),
        }
    }

    /// Falls back to the default position when the coordinates are invalid.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        match GeoPosition::new(latitude, longitude) {
            Ok(position) => Self::new(position),
            Err(e) => {
                tracing::warn!("{}, using default location", e);
                Self::default()
            }
        }
    }

    pub fn set(&self, position: GeoPosition) {
        match self.position.write() {
            Ok(mut guard) => *guard = Some(position),
            Err(poisoned) => *poisoned.into_inner() = Some(position),
        }
    }

    fn current(&self) -> Option<GeoPosition> {
        match self.position.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LocationProvider for ManualLocation {
    fn request_location(&self) -> Result<GeoPosition, LocationError> {
        self.current().ok_or(LocationError::Unsupported)
    }

    fn permission_state(&self) -> PermissionState {
        match self.current() {
            Some(_) => PermissionState::Granted,
            None => PermissionState::Unsupported,
        }
    }
}

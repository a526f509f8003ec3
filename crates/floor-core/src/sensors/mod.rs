//! Inbound sensor data delivered by the platform adapter
//!
//! The adapter owns the device APIs (altimeter, pedometer, motion activity)
//! and permission handling. It hands the monitor plain samples defined here
//! and reports failures through [`SensorError`].

mod activity;

pub use activity::{Activity, ActivitySample};

use chrono::{DateTime, Utc};
use thiserror_no_std::Error;

/// Platform error code for a missing Motion & Fitness authorization
pub const ERROR_CODE_NOT_AUTHORIZED: i64 = 105;
/// Platform error code for motion data that is not available
pub const ERROR_CODE_MOTION_UNAVAILABLE: i64 = 106;
/// Platform error code raised until the device has moved
pub const ERROR_CODE_REQUIRES_MOVEMENT: i64 = 107;

/// Relative altitude update from the barometric altimeter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeSample {
    /// Altitude relative to the first altimeter sample, in meters
    pub relative_altitude_m: f64,
    /// Barometric pressure in hPa
    pub pressure_hpa: f64,
    pub timestamp: DateTime<Utc>,
}

impl AltitudeSample {
    pub fn new(relative_altitude_m: f64, pressure_hpa: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            relative_altitude_m,
            pressure_hpa,
            timestamp,
        }
    }

    /// Build a sample from an altimeter that reports pressure in kPa.
    pub fn from_kpa(relative_altitude_m: f64, pressure_kpa: f64, timestamp: DateTime<Utc>) -> Self {
        Self::new(relative_altitude_m, pressure_kpa * 10.0, timestamp)
    }
}

/// Cumulative pedometer update for the current session.
///
/// Floor counts are `None` on devices without floor counting; they are then
/// treated as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PedometerSample {
    pub steps: u32,
    pub floors_ascended: Option<u32>,
    pub floors_descended: Option<u32>,
}

impl PedometerSample {
    /// Signed floor delta counted by the step counter (`ascended - descended`).
    pub fn walking_floors(&self) -> i32 {
        let up = self.floors_ascended.unwrap_or(0) as i64;
        let down = self.floors_descended.unwrap_or(0) as i64;
        (up - down).clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}

/// Sensors present on the device, reported by the adapter before start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Barometric relative altitude; required to monitor at all
    pub altimeter: bool,
    pub step_counting: bool,
    pub floor_counting: bool,
    pub activity: bool,
}

impl DeviceCapabilities {
    /// A device with every sensor available.
    pub const fn all() -> Self {
        Self {
            altimeter: true,
            step_counting: true,
            floor_counting: true,
            activity: true,
        }
    }
}

/// Failures reported by the sensor adapter.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} is not available on this device")]
    Unavailable {
        /// Name of the missing sensor
        sensor: &'static str,
    },
    #[error("Motion & Fitness permission denied")]
    NotAuthorized,
    #[error("Motion data is not available")]
    MotionUnavailable,
    #[error("Device must move before motion data is available")]
    RequiresMovement,
    #[error("Sensor error (code {code})")]
    Other {
        /// Raw platform error code
        code: i64,
    },
}

impl SensorError {
    /// Map a platform motion error code to a sensor error.
    pub fn from_code(code: i64) -> Self {
        match code {
            ERROR_CODE_NOT_AUTHORIZED => Self::NotAuthorized,
            ERROR_CODE_MOTION_UNAVAILABLE => Self::MotionUnavailable,
            ERROR_CODE_REQUIRES_MOVEMENT => Self::RequiresMovement,
            code => Self::Other { code },
        }
    }

    /// Whether the UI should offer a redirect to the system settings.
    pub const fn needs_settings_redirect(&self) -> bool {
        matches!(self, Self::NotAuthorized)
    }
}

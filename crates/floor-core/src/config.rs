//! Tuning constants for classification and history retention
//!
//! Every field has a default matching the reference behaviour of the floor
//! tracker, so `MonitorConfig::default()` is what devices run with. A JSON
//! document can override any subset of fields:
//!
//! ```json
//! { "averageFloorHeightM": 3.5, "historyCapacity": 200 }
//! ```

use core::fmt::Write;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Height of one storey in meters
pub const AVERAGE_FLOOR_HEIGHT_M: f64 = 3.0;

/// Altitude change below which the device is considered not to have moved
pub const STATIONARY_THRESHOLD_M: f64 = 0.5;

/// Maximum disagreement (in floors) between barometer and step counter for stairs
pub const STAIRS_TOLERANCE_FLOORS: u32 = 1;

/// Number of readings retained in the rolling history
pub const HISTORY_CAPACITY: usize = 100;

/// Seconds after start before the baseline altitude is re-latched
pub const BASELINE_SETTLE_SECS: u32 = 3;

/// Thresholds used by the transport classifier
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifierConfig {
    /// Sensor noise floor; smaller altitude changes classify as stationary
    pub stationary_threshold_m: f64,
    /// Allowed floor-count disagreement for a stairs decision
    pub stairs_tolerance_floors: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            stationary_threshold_m: STATIONARY_THRESHOLD_M,
            stairs_tolerance_floors: STAIRS_TOLERANCE_FLOORS,
        }
    }
}

/// Session-wide configuration
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    pub average_floor_height_m: f64,
    pub history_capacity: usize,
    pub baseline_settle_secs: u32,
    #[serde(flatten)]
    pub classifier: ClassifierConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            average_floor_height_m: AVERAGE_FLOOR_HEIGHT_M,
            history_capacity: HISTORY_CAPACITY,
            baseline_settle_secs: BASELINE_SETTLE_SECS,
            classifier: ClassifierConfig::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config parse failed: {0}")]
    Parse(heapless::String<64>),
    #[error("Invalid config value for {field}")]
    Invalid {
        /// Offending field name
        field: &'static str,
    },
}

impl MonitorConfig {
    /// Parse a JSON document, filling missing fields with defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes).map_err(|e| {
            let mut detail = heapless::String::<64>::new();
            // Long parser messages are truncated to the buffer size
            let _ = write!(detail, "{}", e);
            ConfigError::Parse(detail)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the classifier or history meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.average_floor_height_m > 0.0) {
            return Err(ConfigError::Invalid {
                field: "averageFloorHeightM",
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "historyCapacity",
            });
        }
        if !(self.classifier.stationary_threshold_m >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "stationaryThresholdM",
            });
        }
        Ok(())
    }
}

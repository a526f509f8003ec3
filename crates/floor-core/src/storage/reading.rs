use alloc::format;
use alloc::string::String;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::TransportType;

/// One classified sensor update.
///
/// Created once per altitude update and never modified afterwards. The JSON
/// field names are the export format:
///
/// ```json
/// {
///   "altitude": 9.2, "pressure": 1013.2, "timestamp": "2025-09-15T08:30:00Z",
///   "floor": 3, "walkingFloors": 3, "steps": 245,
///   "transportType": "stairs", "activity": "walking"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Relative altitude in meters since monitoring start
    pub altitude: f64,
    /// Barometric pressure in hPa
    pub pressure: f64,
    pub timestamp: DateTime<Utc>,
    /// Floors moved according to the barometer
    pub floor: i32,
    /// Floors moved according to the step counter
    pub walking_floors: i32,
    /// Cumulative session step count
    pub steps: u32,
    pub transport_type: TransportType,
    /// Activity label at capture time
    pub activity: String,
}

impl Reading {
    /// Barometric minus step-counted floors.
    ///
    /// Non-zero values are expected on elevators and escalators.
    pub fn floor_difference(&self) -> i32 {
        self.floor.saturating_sub(self.walking_floors)
    }

    /// A floor change was estimated, or the altitude moved by more than a meter.
    pub fn is_significant_movement(&self) -> bool {
        self.floor != 0 || self.altitude > 1.0 || self.altitude < -1.0
    }

    pub fn formatted_altitude(&self) -> String {
        format!("{:.2} m", self.altitude)
    }

    pub fn formatted_pressure(&self) -> String {
        format!("{:.1} hPa", self.pressure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stairs_reading() -> Reading {
        Reading {
            altitude: 9.2,
            pressure: 1013.2,
            timestamp: DateTime::from_timestamp(1_757_925_000, 0).unwrap(),
            floor: 3,
            walking_floors: 3,
            steps: 245,
            transport_type: TransportType::Stairs,
            activity: "walking".into(),
        }
    }

    #[test]
    fn test_derived_fields() {
        let reading = stairs_reading();
        assert_eq!(reading.floor_difference(), 0);
        assert!(reading.is_significant_movement());
        assert_eq!(reading.formatted_altitude(), "9.20 m");
        assert_eq!(reading.formatted_pressure(), "1013.2 hPa");

        let elevator = Reading {
            floor: 8,
            walking_floors: 0,
            transport_type: TransportType::Elevator,
            ..stairs_reading()
        };
        assert_eq!(elevator.floor_difference(), 8);

        let still = Reading {
            altitude: 0.4,
            floor: 0,
            ..stairs_reading()
        };
        assert!(!still.is_significant_movement());
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(stairs_reading()).unwrap();
        let object = json.as_object().unwrap();
        for key in [
            "altitude",
            "pressure",
            "timestamp",
            "floor",
            "walkingFloors",
            "steps",
            "transportType",
            "activity",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(object["transportType"], "stairs");
        assert_eq!(object["timestamp"], "2025-09-15T08:30:00Z");
    }
}

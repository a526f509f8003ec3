//! JSON and CSV encodings of the reading history
//!
//! JSON is the interchange format: an ordered array of [`Reading`] objects,
//! accepted back by import. CSV is export-only, for spreadsheets.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use serde::Serialize;
use serde_json::error::Category;
use thiserror_no_std::Error;

use super::Reading;

/// Header row of the CSV export
pub const CSV_HEADER: &str =
    "timestamp,altitude,pressure,floor,walking_floors,steps,transport_type,activity";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("Malformed export payload ({category}) at line {line}, column {column}")]
    Json {
        /// serde_json error category
        category: &'static str,
        /// 1-based line of the failure, 0 when not applicable
        line: usize,
        /// 1-based column of the failure, 0 when not applicable
        column: usize,
    },
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        let category = match e.classify() {
            Category::Io => "io",
            Category::Syntax => "syntax",
            Category::Data => "data",
            Category::Eof => "eof",
        };
        Self::Json {
            category,
            line: e.line(),
            column: e.column(),
        }
    }
}

/// Encode readings as a JSON array, oldest first.
pub fn to_json<T>(readings: &T) -> Result<Vec<u8>, ExportError>
where
    T: Serialize + ?Sized,
{
    Ok(serde_json::to_vec(readings)?)
}

/// Decode a JSON array of readings, preserving order.
pub fn from_json(bytes: &[u8]) -> Result<Vec<Reading>, ExportError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encode readings as CSV with a header row.
pub fn to_csv<'a, I>(readings: I) -> String
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for r in readings {
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            r.timestamp.to_rfc3339(),
            r.altitude,
            r.pressure,
            r.floor,
            r.walking_floors,
            r.steps,
            r.transport_type.label(),
            r.activity,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TransportType;
    use chrono::DateTime;

    fn reading(secs: i64, floor: i32, transport_type: TransportType) -> Reading {
        Reading {
            altitude: floor as f64 * 3.0,
            pressure: 1013.25,
            timestamp: DateTime::from_timestamp(secs, 0).unwrap(),
            floor,
            walking_floors: 0,
            steps: 10,
            transport_type,
            activity: "stationary".into(),
        }
    }

    #[test]
    fn test_json_preserves_order() {
        let readings = vec![
            reading(1_700_000_000, 0, TransportType::Stationary),
            reading(1_700_000_005, 2, TransportType::Elevator),
            reading(1_700_000_010, 4, TransportType::Elevator),
        ];
        let bytes = to_json(&readings).unwrap();
        assert_eq!(from_json(&bytes).unwrap(), readings);
    }

    #[test]
    fn test_unknown_transport_label_falls_back() {
        let payload = br#"[{
            "altitude": 1.0, "pressure": 1000.0, "timestamp": "2025-09-15T08:30:00Z",
            "floor": 0, "walkingFloors": 0, "steps": 3,
            "transportType": "teleporter", "activity": "walking"
        }]"#;
        let readings = from_json(payload).unwrap();
        assert_eq!(readings[0].transport_type, TransportType::Unknown);
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert!(matches!(
            from_json(br#"{"altitude": 1.0}"#),
            Err(ExportError::Json {
                category: "data",
                ..
            })
        ));
        assert!(from_json(br#"[{"altitude": 1.0}]"#).is_err());
        assert!(matches!(
            from_json(b"[{"),
            Err(ExportError::Json { category: "eof", .. })
        ));
    }

    #[test]
    fn test_csv_layout() {
        let csv = to_csv(&[reading(1_757_925_000, 2, TransportType::Stairs)]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("2025-09-15T08:30:00+00:00,6,1013.25,2,0,10,stairs,stationary")
        );
        assert_eq!(lines.next(), None);
    }
}

//! Sensor-fusion transport classifier
//!
//! Fuses three independent signals into one decision:
//!
//! - the barometric floor estimate (altitude change since the baseline),
//! - the step counter's own floor count (ascended minus descended),
//! - the latest coarse motion activity.
//!
//! The interesting evidence is *disagreement* between the first two: an
//! altitude change with no counted floors means the body was carried
//! (elevator when still, escalator when walking), while matching counts mean
//! stairs. [`classify`] is a pure function; the monitor keeps the previous
//! decision for transition logging.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::sensors::Activity;

/// How the user is currently moving between (or along) floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Stairs,
    Elevator,
    Escalator,
    Stationary,
    Walking,
    /// Not enough evidence yet; also the decoding fallback for unknown labels.
    /// Must stay the last variant for `#[serde(other)]`.
    #[serde(other)]
    Unknown,
}

impl TransportType {
    /// Machine label, used for exports and label ordering
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Stairs => "stairs",
            Self::Elevator => "elevator",
            Self::Escalator => "escalator",
            Self::Stationary => "stationary",
            Self::Walking => "walking",
        }
    }

    /// Human readable name for status lines
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Unknown => "Analyzing",
            Self::Stairs => "Stairs",
            Self::Elevator => "Elevator",
            Self::Escalator => "Escalator",
            Self::Stationary => "Stationary",
            Self::Walking => "Walking",
        }
    }

    /// Why a reading was given this classification
    pub const fn description(self) -> &'static str {
        match self {
            Self::Unknown => "Analyzing sensor data to determine how you are moving.",
            Self::Stairs => "Steps and step-counted floors agree with the barometer: stairs.",
            Self::Elevator => "Altitude changed while the body stayed still: elevator.",
            Self::Escalator => "Walking detected but no floors were step-counted: escalator.",
            Self::Stationary => "Altitude is essentially unchanged: stationary.",
            Self::Walking => "Walking on level ground.",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fused sensor state at the moment of classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierInput {
    /// Current relative altitude in meters
    pub current_altitude: f64,
    /// Altitude latched at session start
    pub baseline_altitude: f64,
    /// Floors moved according to the barometer
    pub floor_delta: i32,
    /// Floors moved according to the step counter
    pub walking_floor_delta: i32,
    /// Latest activity, `None` until the first activity sample arrives
    pub activity: Option<Activity>,
}

/// `true` when `value` lies strictly inside `(-threshold, threshold)`.
pub(crate) fn within(value: f64, threshold: f64) -> bool {
    value > -threshold && value < threshold
}

/// Estimated floor delta: `round((altitude - baseline) / floor_height)`,
/// rounding half away from zero.
pub fn floor_from_altitude(altitude: f64, baseline: f64, floor_height: f64) -> i32 {
    // Float-to-int casts saturate
    libm::round((altitude - baseline) / floor_height) as i32
}

/// Classify the current transport mode. First matching rule wins.
pub fn classify(input: &ClassifierInput, config: &ClassifierConfig) -> TransportType {
    let altitude_delta = input.current_altitude - input.baseline_altitude;
    if within(altitude_delta, config.stationary_threshold_m) {
        return TransportType::Stationary;
    }

    let Some(activity) = input.activity else {
        return TransportType::Unknown;
    };

    let floor_change = input.floor_delta.unsigned_abs();
    let walking_change = input.walking_floor_delta.unsigned_abs();

    if floor_change > 0 && walking_change == 0 {
        match activity {
            Activity::Stationary => TransportType::Elevator,
            Activity::Walking => TransportType::Escalator,
            _ => TransportType::Unknown,
        }
    } else if floor_change > 0
        && walking_change > 0
        && floor_change.abs_diff(walking_change) <= config.stairs_tolerance_floors
    {
        TransportType::Stairs
    } else if activity == Activity::Walking && floor_change == 0 {
        TransportType::Walking
    } else {
        TransportType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(
        altitude_change: f64,
        floor_delta: i32,
        walking_floor_delta: i32,
        activity: Option<Activity>,
    ) -> ClassifierInput {
        ClassifierInput {
            current_altitude: 10.0 + altitude_change,
            baseline_altitude: 10.0,
            floor_delta,
            walking_floor_delta,
            activity,
        }
    }

    fn run(input: ClassifierInput) -> TransportType {
        classify(&input, &ClassifierConfig::default())
    }

    #[test]
    fn test_small_altitude_change_is_always_stationary() {
        for activity in [None, Some(Activity::Walking), Some(Activity::Stationary)] {
            for (floors, walking) in [(0, 0), (3, 0), (4, 4), (-2, 7)] {
                assert_eq!(
                    run(input(0.49, floors, walking, activity)),
                    TransportType::Stationary
                );
                assert_eq!(
                    run(input(-0.3, floors, walking, activity)),
                    TransportType::Stationary
                );
            }
        }
    }

    #[test]
    fn test_missing_activity_is_unknown() {
        assert_eq!(run(input(0.5, 0, 0, None)), TransportType::Unknown);
        assert_eq!(run(input(9.0, 3, 3, None)), TransportType::Unknown);
    }

    #[test]
    fn test_elevator() {
        assert_eq!(
            run(input(5.0, 3, 0, Some(Activity::Stationary))),
            TransportType::Elevator
        );
        assert_eq!(
            run(input(-9.0, -3, 0, Some(Activity::Stationary))),
            TransportType::Elevator
        );
    }

    #[test]
    fn test_stairs_within_tolerance() {
        assert_eq!(
            run(input(12.0, 4, 4, Some(Activity::Walking))),
            TransportType::Stairs
        );
        assert_eq!(
            run(input(12.0, 4, 3, Some(Activity::Walking))),
            TransportType::Stairs
        );
        assert_eq!(
            run(input(-6.0, -2, -3, Some(Activity::Running))),
            TransportType::Stairs
        );
        assert_eq!(
            run(input(12.0, 4, 2, Some(Activity::Walking))),
            TransportType::Unknown
        );
    }

    #[test]
    fn test_escalator() {
        assert_eq!(
            run(input(12.0, 4, 0, Some(Activity::Walking))),
            TransportType::Escalator
        );
        assert_eq!(
            run(input(12.0, 4, 0, Some(Activity::Automotive))),
            TransportType::Unknown
        );
    }

    #[test]
    fn test_flat_walking() {
        assert_eq!(
            run(input(1.0, 0, 0, Some(Activity::Walking))),
            TransportType::Walking
        );
        assert_eq!(
            run(input(1.0, 0, 0, Some(Activity::Stationary))),
            TransportType::Unknown
        );
        // Step-counted floors alone do not block a flat-walking decision
        assert_eq!(
            run(input(1.0, 0, 2, Some(Activity::Walking))),
            TransportType::Walking
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let sample = input(7.5, 2, 0, Some(Activity::Stationary));
        let first = run(sample);
        for _ in 0..10 {
            assert_eq!(run(sample), first);
        }
    }

    #[test]
    fn test_floor_from_altitude_rounds_half_away_from_zero() {
        assert_eq!(floor_from_altitude(0.0, 0.0, 3.0), 0);
        assert_eq!(floor_from_altitude(1.4, 0.0, 3.0), 0);
        assert_eq!(floor_from_altitude(4.5, 0.0, 3.0), 2);
        assert_eq!(floor_from_altitude(-4.5, 0.0, 3.0), -2);
        assert_eq!(floor_from_altitude(9.2, 0.0, 3.0), 3);
        assert_eq!(floor_from_altitude(14.0, 2.0, 3.0), 4);
    }

    #[test]
    fn test_floor_from_altitude_just_below_half() {
        // Quotient is 0.49999999999999994; adding 0.5 would round it up
        assert_eq!(floor_from_altitude(1.4999999999999998, 0.0, 3.0), 0);
        assert_eq!(floor_from_altitude(-1.4999999999999998, 0.0, 3.0), 0);
    }

    const ALL_TYPES: [TransportType; 6] = [
        TransportType::Stairs,
        TransportType::Elevator,
        TransportType::Escalator,
        TransportType::Stationary,
        TransportType::Walking,
        TransportType::Unknown,
    ];

    #[test]
    fn test_serde_uses_labels() {
        for t in ALL_TYPES {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.label()));
            assert_eq!(serde_json::from_str::<TransportType>(&json).unwrap(), t);
        }
        assert_eq!(
            serde_json::from_str::<TransportType>("\"hovercraft\"").unwrap(),
            TransportType::Unknown
        );
    }

    #[test]
    fn test_descriptions_are_distinct() {
        for (i, a) in ALL_TYPES.iter().enumerate() {
            assert!(!a.description().is_empty());
            for b in &ALL_TYPES[i + 1..] {
                assert_ne!(a.description(), b.description());
            }
        }
        assert!(TransportType::Elevator.description().contains("elevator"));
    }
}

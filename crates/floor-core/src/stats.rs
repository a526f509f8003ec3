//! Statistics derived from the reading history
//!
//! Nothing here is stored: both structures are recomputed from the current
//! history on demand, and an empty history yields well-defined zero values.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use chrono::TimeDelta;

use crate::classifier::TransportType;
use crate::config::AVERAGE_FLOOR_HEIGHT_M;
use crate::storage::Reading;

/// Aggregates shown on the history screen.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStatistics {
    pub total_readings: usize,
    /// Highest floor reached, 0 when empty
    pub max_floor: i32,
    /// Lowest floor reached, 0 when empty
    pub min_floor: i32,
    /// Steps of the newest reading (steps are cumulative)
    pub total_steps: u32,
    /// Occurrences of each transport type present
    pub transport_counts: BTreeMap<TransportType, usize>,
    /// Transport types present, ordered by label
    pub available_transport_types: Vec<TransportType>,
    /// Newest minus oldest timestamp
    pub total_monitoring_time: TimeDelta,
    /// Mean of `|floor|` across readings
    pub average_floor_change: f64,
    /// Highest count; ties go to the type whose label sorts first
    pub most_used_transport: TransportType,
}

impl Default for HistoryStatistics {
    fn default() -> Self {
        Self {
            total_readings: 0,
            max_floor: 0,
            min_floor: 0,
            total_steps: 0,
            transport_counts: BTreeMap::new(),
            available_transport_types: Vec::new(),
            total_monitoring_time: TimeDelta::zero(),
            average_floor_change: 0.0,
            most_used_transport: TransportType::Unknown,
        }
    }
}

impl HistoryStatistics {
    /// Aggregate readings given oldest first.
    pub fn from_readings<'a, I>(readings: I) -> Self
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut stats = Self::default();
        let mut first: Option<&Reading> = None;
        let mut last: Option<&Reading> = None;
        let mut floor_change_sum: u64 = 0;

        for reading in readings {
            if first.is_none() {
                stats.max_floor = reading.floor;
                stats.min_floor = reading.floor;
                first = Some(reading);
            }
            stats.total_readings += 1;
            stats.max_floor = stats.max_floor.max(reading.floor);
            stats.min_floor = stats.min_floor.min(reading.floor);
            floor_change_sum += u64::from(reading.floor.unsigned_abs());
            *stats
                .transport_counts
                .entry(reading.transport_type)
                .or_insert(0) += 1;
            last = Some(reading);
        }

        if let (Some(first), Some(last)) = (first, last) {
            stats.total_steps = last.steps;
            stats.total_monitoring_time = last.timestamp - first.timestamp;
            stats.average_floor_change = floor_change_sum as f64 / stats.total_readings as f64;
        }

        stats.available_transport_types = stats.transport_counts.keys().copied().collect();
        stats.available_transport_types.sort_by_key(|t| t.label());
        stats.most_used_transport = most_used(&stats.transport_counts);

        stats
    }

    /// Monitoring time as `"{minutes}m {seconds}s"`.
    pub fn formatted_monitoring_time(&self) -> String {
        let secs = self.total_monitoring_time.num_seconds().max(0);
        format!("{}m {}s", secs / 60, secs % 60)
    }

    /// Occurrences of one transport type.
    pub fn count_of(&self, transport_type: TransportType) -> usize {
        self.transport_counts
            .get(&transport_type)
            .copied()
            .unwrap_or(0)
    }
}

/// Session-level summary exposed through the recorder capability.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorSummary {
    /// 1 when any reading exists, 0 otherwise
    pub total_sessions: u32,
    /// Sum of positive floor values across readings
    pub total_floors_climbed: i64,
    /// Sum of `|floor|` across readings below the baseline
    pub total_floors_descended: i64,
    pub total_steps: u32,
    pub average_floor_height: f64,
    pub most_used_transport: TransportType,
    pub total_monitoring_time: TimeDelta,
}

impl FloorSummary {
    pub fn empty() -> Self {
        Self {
            total_sessions: 0,
            total_floors_climbed: 0,
            total_floors_descended: 0,
            total_steps: 0,
            average_floor_height: AVERAGE_FLOOR_HEIGHT_M,
            most_used_transport: TransportType::Unknown,
            total_monitoring_time: TimeDelta::zero(),
        }
    }

    pub fn from_readings<'a, I>(readings: I) -> Self
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut summary = Self::empty();
        let mut counts: BTreeMap<TransportType, usize> = BTreeMap::new();
        let mut first: Option<&Reading> = None;
        let mut last: Option<&Reading> = None;

        for reading in readings {
            if first.is_none() {
                first = Some(reading);
            }
            last = Some(reading);

            if reading.floor > 0 {
                summary.total_floors_climbed += i64::from(reading.floor);
            } else {
                summary.total_floors_descended += i64::from(reading.floor.unsigned_abs());
            }
            *counts.entry(reading.transport_type).or_insert(0) += 1;
        }

        if let (Some(first), Some(last)) = (first, last) {
            summary.total_sessions = 1;
            summary.total_steps = last.steps;
            summary.total_monitoring_time = last.timestamp - first.timestamp;
        }
        summary.most_used_transport = most_used(&counts);

        summary
    }

    /// Monitoring time as `"{hours}h {minutes}m"`.
    pub fn formatted_monitoring_time(&self) -> String {
        let secs = self.total_monitoring_time.num_seconds().max(0);
        format!("{}h {}m", secs / 3600, secs % 3600 / 60)
    }
}

fn most_used(counts: &BTreeMap<TransportType, usize>) -> TransportType {
    let mut best: Option<(TransportType, usize)> = None;
    for (&transport_type, &count) in counts {
        best = match best {
            Some((current, current_count))
                if current_count > count
                    || (current_count == count && current.label() <= transport_type.label()) =>
            {
                Some((current, current_count))
            }
            _ => Some((transport_type, count)),
        };
    }
    best.map_or(TransportType::Unknown, |(t, _)| t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn reading(secs: i64, floor: i32, steps: u32, transport_type: TransportType) -> Reading {
        Reading {
            altitude: floor as f64 * 3.0,
            pressure: 1010.0,
            timestamp: DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap(),
            floor,
            walking_floors: 0,
            steps,
            transport_type,
            activity: "walking".into(),
        }
    }

    fn sample_history() -> Vec<Reading> {
        vec![
            reading(0, 0, 0, TransportType::Stationary),
            reading(30, 2, 40, TransportType::Stairs),
            reading(60, 4, 80, TransportType::Stairs),
            reading(90, -1, 90, TransportType::Elevator),
            reading(125, -3, 95, TransportType::Walking),
        ]
    }

    #[test]
    fn test_empty_history_defaults() {
        let empty: Vec<Reading> = Vec::new();
        let stats = HistoryStatistics::from_readings(&empty);
        assert_eq!(stats.total_readings, 0);
        assert_eq!(stats.max_floor, 0);
        assert_eq!(stats.min_floor, 0);
        assert_eq!(stats.total_steps, 0);
        assert_eq!(stats.total_monitoring_time, TimeDelta::zero());
        assert!(stats.transport_counts.is_empty());
        assert!(stats.available_transport_types.is_empty());
        assert_eq!(stats.average_floor_change, 0.0);
        assert_eq!(stats.most_used_transport, TransportType::Unknown);
    }

    #[test]
    fn test_aggregates() {
        let history = sample_history();
        let stats = HistoryStatistics::from_readings(&history);

        assert_eq!(stats.total_readings, 5);
        assert_eq!(stats.max_floor, 4);
        assert_eq!(stats.min_floor, -3);
        assert_eq!(stats.total_steps, 95);
        assert_eq!(stats.total_monitoring_time, TimeDelta::seconds(125));
        assert_eq!(stats.formatted_monitoring_time(), "2m 5s");
        assert_eq!(stats.average_floor_change, 10.0 / 5.0);
        assert_eq!(stats.count_of(TransportType::Stairs), 2);
        assert_eq!(stats.count_of(TransportType::Escalator), 0);
        assert_eq!(stats.most_used_transport, TransportType::Stairs);
    }

    #[test]
    fn test_available_types_ordered_by_label() {
        let stats = HistoryStatistics::from_readings(&sample_history());
        assert_eq!(
            stats.available_transport_types,
            vec![
                TransportType::Elevator,
                TransportType::Stairs,
                TransportType::Stationary,
                TransportType::Walking,
            ]
        );
    }

    #[test]
    fn test_all_negative_floors() {
        let history = vec![
            reading(0, -2, 0, TransportType::Elevator),
            reading(10, -5, 0, TransportType::Elevator),
        ];
        let stats = HistoryStatistics::from_readings(&history);
        assert_eq!(stats.max_floor, -2);
        assert_eq!(stats.min_floor, -5);
    }

    #[test]
    fn test_most_used_tie_breaks_by_label() {
        let history = vec![
            reading(0, 1, 0, TransportType::Walking),
            reading(1, 1, 0, TransportType::Escalator),
        ];
        let stats = HistoryStatistics::from_readings(&history);
        assert_eq!(stats.most_used_transport, TransportType::Escalator);
    }

    #[test]
    fn test_summary() {
        let summary = FloorSummary::from_readings(&sample_history());
        assert_eq!(summary.total_sessions, 1);
        assert_eq!(summary.total_floors_climbed, 6);
        assert_eq!(summary.total_floors_descended, 4);
        assert_eq!(summary.total_steps, 95);
        assert_eq!(summary.average_floor_height, 3.0);
        assert_eq!(summary.most_used_transport, TransportType::Stairs);
        assert_eq!(summary.formatted_monitoring_time(), "0h 2m");
    }

    #[test]
    fn test_empty_summary() {
        let empty: Vec<Reading> = Vec::new();
        assert_eq!(FloorSummary::from_readings(&empty), FloorSummary::empty());
    }
}

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, warn};

use super::export::{self, ExportError};
use super::Reading;
use crate::classifier::TransportType;
use crate::config::HISTORY_CAPACITY;
use crate::stats::{FloorSummary, HistoryStatistics};

/// Bounded, insertion-ordered log of classified readings.
///
/// Once `capacity` readings are held, each append evicts the oldest one
/// (FIFO), so memory stays fixed for the whole session:
///
/// - 100 readings × ~80 bytes ≈ 8 KB plus activity labels
#[derive(Debug)]
pub struct ReadingHistory {
    /// Ring buffer, oldest at the front
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl Default for ReadingHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl ReadingHistory {
    /// Create an empty history. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, returning the evicted oldest reading if the buffer was full.
    pub fn append(&mut self, reading: Reading) -> Option<Reading> {
        let evicted = if self.readings.len() >= self.capacity {
            self.readings.pop_front()
        } else {
            None
        };
        self.readings.push_back(reading);
        evicted
    }

    /// Drop every reading.
    pub fn reset(&mut self) {
        self.readings.clear();
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest → newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Reading> + ExactSizeIterator {
        self.readings.iter()
    }

    pub fn first(&self) -> Option<&Reading> {
        self.readings.front()
    }

    pub fn last(&self) -> Option<&Reading> {
        self.readings.back()
    }

    pub fn get(&self, index: usize) -> Option<&Reading> {
        self.readings.get(index)
    }

    /// Readings of one transport type, oldest first.
    pub fn filter_by(&self, transport_type: TransportType) -> impl Iterator<Item = &Reading> {
        self.readings
            .iter()
            .filter(move |r| r.transport_type == transport_type)
    }

    pub fn compute_statistics(&self) -> HistoryStatistics {
        HistoryStatistics::from_readings(self.readings.iter())
    }

    pub fn summary(&self) -> FloorSummary {
        FloorSummary::from_readings(self.readings.iter())
    }

    /// Serialize the full ordered history as a JSON array.
    pub fn export_json(&self) -> Result<Vec<u8>, ExportError> {
        export::to_json(&self.readings)
    }

    pub fn export_csv(&self) -> String {
        export::to_csv(self.readings.iter())
    }

    /// Replace the history with a JSON payload.
    ///
    /// Returns `false` and leaves the history untouched when the payload does
    /// not decode into an ordered list of readings.
    pub fn import_json(&mut self, bytes: &[u8]) -> bool {
        match self.try_import_json(bytes) {
            Ok(_) => true,
            Err(e) => {
                warn!("History import rejected: {}", e);
                false
            }
        }
    }

    /// Like [`import_json`](Self::import_json), reporting why a payload was rejected.
    ///
    /// On success returns the number of readings now held. Payloads longer
    /// than the capacity keep their newest readings.
    pub fn try_import_json(&mut self, bytes: &[u8]) -> Result<usize, ExportError> {
        let imported = export::from_json(bytes)?;
        let skip = imported.len().saturating_sub(self.capacity);
        if skip > 0 {
            debug!(
                "Import of {} readings exceeds capacity {}, dropping {} oldest",
                imported.len(),
                self.capacity,
                skip
            );
        }

        self.readings.clear();
        self.readings.extend(imported.into_iter().skip(skip));
        Ok(self.readings.len())
    }
}

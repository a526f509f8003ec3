//! Hardware-independent core library for floor-rs
//!
//! This crate contains the platform-agnostic logic of the floor tracker:
//! the sensor-fusion transport classifier, the bounded reading history and
//! its statistics, JSON/CSV export, and the monitoring session that ties the
//! altimeter, pedometer and motion-activity callbacks together.
//!
//! It is `no_std` with `extern crate alloc` so it compiles on both
//! wearable/embedded targets and desktop hosts (for the simulator). Unit tests
//! build against `std`.
//!
//! # Example
//!
//! ```ignore
//! use floor_core::monitor::FloorMonitor;
//! use floor_core::config::MonitorConfig;
//! use floor_core::sensors::{AltitudeSample, DeviceCapabilities};
//!
//! let mut monitor = FloorMonitor::new(MonitorConfig::default());
//! monitor.start(DeviceCapabilities::all(), now)?;
//!
//! // Sensor callbacks are serialized onto the monitor
//! if let Some(reading) = monitor.on_altitude(AltitudeSample::new(6.1, 1012.4, now)) {
//!     log::info!("{} -> floor {}", reading.transport_type, reading.floor);
//! }
//!
//! let stats = monitor.statistics();
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod classifier;
pub mod config;
pub mod events;
pub mod monitor;
pub mod sensors;
pub mod stats;
pub mod storage;

pub use classifier::{ClassifierInput, TransportType, classify};
pub use monitor::{FloorMonitor, FloorRecorder, MonitorError};
pub use stats::{FloorSummary, HistoryStatistics};
pub use storage::{Reading, ReadingHistory};

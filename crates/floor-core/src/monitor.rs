//! Monitoring session: the single owner of classifier and history state
//!
//! The platform adapter delivers three independent callback streams
//! (altitude, pedometer, activity). They must be serialized onto one
//! `FloorMonitor` (`&mut self`): either call it from one task, or share it
//! behind [`SharedMonitor`].
//!
//! Each altitude update produces one classified [`Reading`]. Pedometer and
//! activity updates only refresh the fused state that the next altitude
//! update classifies against.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start──▶ Starting ──settle──▶ Active ──stop──▶ Stopped
//!   ▲                                                     │
//!   └────────────────────────reset────────────────────────┘
//! ```
//!
//! `stop` and `reset` are accepted from every state; `start` from a stopped
//! session resumes appending to the retained history.
//!
//! The baseline altitude is re-latched `baseline_settle_secs` after start so
//! the barometer can settle; until then floors are counted from the previous
//! baseline (zero for a fresh session).

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use chrono::{DateTime, TimeDelta, Utc};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex as AsyncMutex;
use log::{debug, error, info, warn};
use thiserror_no_std::Error;

use crate::classifier::{ClassifierInput, TransportType, classify, floor_from_altitude, within};
use crate::config::MonitorConfig;
use crate::events::{MonitorEvent, MonitorPublisher, MonitorSnapshot};
use crate::sensors::{
    Activity, ActivitySample, AltitudeSample, DeviceCapabilities, PedometerSample, SensorError,
};
use crate::stats::{FloorSummary, HistoryStatistics};
use crate::storage::{ExportError, Reading, ReadingHistory};

const STATUS_READY: &str = "Ready";
const STATUS_STARTING: &str = "Monitoring all sensors...";
const STATUS_ACTIVE: &str = "All sensors active";
const STATUS_STOPPED: &str = "Monitoring stopped";
const STATUS_RESET: &str = "All data reset";
const STATUS_RESUMING: &str = "Checking sensor status...";
const STATUS_NO_BAROMETER: &str = "Barometer not supported on this device";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorRunState {
    /// Never started, or reset
    Idle,
    /// Monitoring, baseline not latched yet
    Starting,
    /// Monitoring against a latched baseline
    Active,
    /// Stopped with history retained
    Stopped,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("{sensor} is not available on this device")]
    SensorUnavailable {
        /// Name of the missing sensor
        sensor: &'static str,
    },
    #[error("Export failed: {0}")]
    Export(ExportError),
}

impl From<ExportError> for MonitorError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Monitor shared between sensor callback tasks.
pub type SharedMonitor<'a> = AsyncMutex<CriticalSectionRawMutex, FloorMonitor<'a>>;

/// Export, import and statistics capabilities of a floor recorder.
///
/// Export and the statistics queries have default implementations over
/// [`history`](FloorRecorder::history); import is recorder specific because it
/// replaces state.
pub trait FloorRecorder {
    fn history(&self) -> &ReadingHistory;

    /// Replace the history with a JSON export. Returns `false` on a malformed
    /// payload, leaving the history untouched.
    fn import_data(&mut self, bytes: &[u8]) -> bool;

    /// JSON array of every retained reading, oldest first.
    fn export_data(&self) -> Result<Vec<u8>, MonitorError> {
        Ok(self.history().export_json()?)
    }

    fn statistics(&self) -> HistoryStatistics {
        self.history().compute_statistics()
    }

    fn summary(&self) -> FloorSummary {
        self.history().summary()
    }
}

/// Read-only view handed to UI layers.
#[derive(Debug, Clone)]
pub struct MonitorState<'h> {
    pub snapshot: MonitorSnapshot,
    /// The UI should offer a redirect to the system settings
    pub show_permission_alert: bool,
    pub history: &'h ReadingHistory,
}

/// Floor tracking session fusing altimeter, pedometer and activity data.
pub struct FloorMonitor<'a> {
    config: MonitorConfig,
    run_state: MonitorRunState,
    capabilities: DeviceCapabilities,

    // Fused sensor state
    relative_altitude: f64,
    pressure: f64,
    current_floor: i32,
    walking_floors: i32,
    total_steps: u32,
    activity: Option<Activity>,
    transport_type: TransportType,

    // Baseline handling
    baseline_altitude: f64,
    session_start: Option<DateTime<Utc>>,

    status_text: String,
    show_permission_alert: bool,
    history: ReadingHistory,
    publisher: Option<MonitorPublisher<'a>>,
}

impl core::fmt::Debug for FloorMonitor<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FloorMonitor")
            .field("run_state", &self.run_state)
            .field("current_floor", &self.current_floor)
            .field("transport_type", &self.transport_type)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl<'a> FloorMonitor<'a> {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            run_state: MonitorRunState::Idle,
            capabilities: DeviceCapabilities::all(),
            relative_altitude: 0.0,
            pressure: 0.0,
            current_floor: 0,
            walking_floors: 0,
            total_steps: 0,
            activity: None,
            transport_type: TransportType::Unknown,
            baseline_altitude: 0.0,
            session_start: None,
            status_text: String::from(STATUS_READY),
            show_permission_alert: false,
            history: ReadingHistory::new(config.history_capacity),
            publisher: None,
        }
    }

    /// Publish snapshots and transitions on an event channel.
    pub fn with_publisher(mut self, publisher: MonitorPublisher<'a>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Start a monitoring session.
    ///
    /// Fails without starting when the device has no barometric altimeter.
    /// Missing step counting, floor counting or activity recognition only
    /// degrade classification. Starting an active session does nothing,
    /// whatever capabilities are passed.
    pub fn start(
        &mut self,
        capabilities: DeviceCapabilities,
        now: DateTime<Utc>,
    ) -> Result<(), MonitorError> {
        if self.is_monitoring() {
            debug!("start() while already monitoring, ignoring");
            return Ok(());
        }

        if !capabilities.altimeter {
            error!("Relative altitude is not available, not starting");
            self.set_status(STATUS_NO_BAROMETER);
            self.publish_snapshot();
            return Err(MonitorError::SensorUnavailable { sensor: "altimeter" });
        }

        if !capabilities.step_counting {
            warn!("Step counting unavailable, stairs cannot be detected");
        } else if !capabilities.floor_counting {
            warn!("Floor counting unavailable, using step count only");
        }
        if !capabilities.activity {
            warn!("Activity recognition unavailable, transport will stay unknown");
        }

        self.capabilities = capabilities;
        self.session_start = Some(now);
        self.run_state = MonitorRunState::Starting;
        self.set_status(STATUS_STARTING);
        info!("Monitoring started at {}", now);

        self.publish_snapshot();
        Ok(())
    }

    /// Stop monitoring. History is kept; stopping twice is a no-op.
    pub fn stop(&mut self) {
        if !self.is_monitoring() {
            debug!("stop() while not monitoring, ignoring");
            return;
        }

        self.run_state = MonitorRunState::Stopped;
        self.session_start = None;
        self.set_status(STATUS_STOPPED);
        info!(
            "Monitoring stopped: floor {}, steps {}, transport {}",
            self.current_floor, self.total_steps, self.transport_type
        );

        self.publish(MonitorEvent::Stopped);
        self.publish_snapshot();
    }

    /// Stop and clear everything: readings, fused state, baseline and the
    /// last seen activity.
    pub fn reset(&mut self) {
        self.stop();

        self.run_state = MonitorRunState::Idle;
        self.relative_altitude = 0.0;
        self.pressure = 0.0;
        self.current_floor = 0;
        self.walking_floors = 0;
        self.total_steps = 0;
        self.activity = None;
        self.transport_type = TransportType::Unknown;
        self.baseline_altitude = 0.0;
        self.session_start = None;
        self.history.reset();
        self.set_status(STATUS_RESET);
        info!("All measurements reset");

        self.publish(MonitorEvent::Reset);
        self.publish_snapshot();
    }

    /// Latch the baseline once the settle delay has elapsed.
    ///
    /// Called on every altitude update; adapters with their own timer may call
    /// it directly. Returns `true` when the baseline was latched by this call.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.run_state != MonitorRunState::Starting {
            return false;
        }
        let Some(start) = self.session_start else {
            return false;
        };
        if now - start < TimeDelta::seconds(i64::from(self.config.baseline_settle_secs)) {
            return false;
        }

        self.baseline_altitude = self.relative_altitude;
        self.run_state = MonitorRunState::Active;
        self.set_status(STATUS_ACTIVE);
        info!("Baseline latched at {:.2} m", self.baseline_altitude);

        self.publish(MonitorEvent::BaselineLatched {
            baseline_altitude: self.baseline_altitude,
        });
        true
    }

    /// Process an altimeter update and record the classified reading.
    ///
    /// Returns `None` when not monitoring.
    pub fn on_altitude(&mut self, sample: AltitudeSample) -> Option<Reading> {
        if !self.is_monitoring() {
            debug!("Ignoring altitude sample while not monitoring");
            return None;
        }

        self.tick(sample.timestamp);

        self.relative_altitude = sample.relative_altitude_m;
        self.pressure = sample.pressure_hpa;
        self.current_floor = floor_from_altitude(
            self.relative_altitude,
            self.baseline_altitude,
            self.config.average_floor_height_m,
        );

        self.update_transport_type();

        let reading = Reading {
            altitude: self.relative_altitude,
            pressure: self.pressure,
            timestamp: sample.timestamp,
            floor: self.current_floor,
            walking_floors: self.walking_floors,
            steps: self.total_steps,
            transport_type: self.transport_type,
            activity: String::from(self.activity_label()),
        };
        if let Some(evicted) = self.history.append(reading.clone()) {
            debug!("History full, evicted reading from {}", evicted.timestamp);
        }

        self.update_status_text();
        debug!(
            "Altitude {:.2} m, pressure {:.1} hPa, floor {}",
            self.relative_altitude, self.pressure, self.current_floor
        );

        self.publish_snapshot();
        Some(reading)
    }

    /// Process a cumulative pedometer update.
    pub fn on_pedometer(&mut self, sample: PedometerSample) {
        if !self.is_monitoring() {
            debug!("Ignoring pedometer sample while not monitoring");
            return;
        }

        self.total_steps = sample.steps;
        self.walking_floors = if self.capabilities.floor_counting {
            sample.walking_floors()
        } else {
            0
        };
        debug!(
            "Pedometer: {} steps, walked floors {} (+{}/-{})",
            self.total_steps,
            self.walking_floors,
            sample.floors_ascended.unwrap_or(0),
            sample.floors_descended.unwrap_or(0)
        );

        self.publish_snapshot();
    }

    /// Process a motion activity update.
    pub fn on_activity(&mut self, sample: ActivitySample) {
        if !self.is_monitoring() {
            debug!("Ignoring activity sample while not monitoring");
            return;
        }

        let activity = sample.activity();
        if Some(activity) != self.activity {
            info!("Activity changed: {} -> {}", self.activity_label(), activity);
        }
        self.activity = Some(activity);

        self.publish_snapshot();
    }

    /// Stop after an adapter failure and explain it in the status text.
    pub fn handle_sensor_error(&mut self, err: SensorError) {
        error!("Sensor failure, stopping: {}", err);
        self.stop();

        if err.needs_settings_redirect() {
            self.show_permission_alert = true;
        }
        match err {
            SensorError::NotAuthorized => self.set_status("Motion & Fitness permission required"),
            SensorError::MotionUnavailable => self.set_status("Motion data unavailable"),
            SensorError::RequiresMovement => self.set_status("Please move the device slightly"),
            SensorError::Unavailable { sensor } => {
                self.status_text = format!("{} not available", sensor);
            }
            SensorError::Other { code } => {
                debug!("Unmapped sensor error code {}", code);
                self.set_status("Sensor error occurred");
            }
        }

        self.publish(MonitorEvent::SensorFailed(err));
        self.publish_snapshot();
    }

    /// Clear the permission alert once the UI has shown it.
    pub fn acknowledge_permission_alert(&mut self) {
        self.show_permission_alert = false;
    }

    /// App returned to the foreground.
    pub fn on_resume(&mut self) {
        info!("Resumed, monitoring: {}", self.is_monitoring());
        if self.is_monitoring() {
            self.set_status(STATUS_RESUMING);
            self.publish_snapshot();
        }
    }

    fn update_transport_type(&mut self) {
        let input = ClassifierInput {
            current_altitude: self.relative_altitude,
            baseline_altitude: self.baseline_altitude,
            floor_delta: self.current_floor,
            walking_floor_delta: self.walking_floors,
            activity: self.activity,
        };
        let previous = self.transport_type;
        self.transport_type = classify(&input, &self.config.classifier);

        if previous != self.transport_type {
            info!("Transport changed: {} -> {}", previous, self.transport_type);
            self.publish(MonitorEvent::TransportChanged {
                from: previous,
                to: self.transport_type,
            });
        }
    }

    fn update_status_text(&mut self) {
        let delta = self.relative_altitude - self.baseline_altitude;
        let name = self.transport_type.display_name();

        if within(delta, self.config.classifier.stationary_threshold_m) {
            self.status_text = format!("Base floor ({})", name);
            return;
        }

        let direction = if delta > 0.0 { "Up" } else { "Down" };
        let floors = self.current_floor.unsigned_abs();
        let unit = if floors == 1 { "floor" } else { "floors" };
        let mut text = format!("{} {} {} - {}", direction, floors, unit, name);
        if self.walking_floors != self.current_floor && self.walking_floors != 0 {
            // Writing into a String cannot fail
            let _ = write!(text, " (walked: {} floors)", self.walking_floors.unsigned_abs());
        }
        self.status_text = text;
    }

    fn set_status(&mut self, text: &str) {
        self.status_text.clear();
        self.status_text.push_str(text);
    }

    fn publish(&self, event: MonitorEvent) {
        if let Some(publisher) = &self.publisher {
            publisher.publish_immediate(event);
        }
    }

    fn publish_snapshot(&self) {
        if self.publisher.is_some() {
            self.publish(MonitorEvent::Updated(self.snapshot()));
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            current_floor: self.current_floor,
            relative_altitude: self.relative_altitude,
            pressure: self.pressure,
            is_monitoring: self.is_monitoring(),
            status_text: self.status_text.clone(),
            transport_type: self.transport_type,
            walking_floors: self.walking_floors,
            total_steps: self.total_steps,
            activity_label: self.activity_label(),
            history_len: self.history.len(),
        }
    }

    pub fn state(&self) -> MonitorState<'_> {
        MonitorState {
            snapshot: self.snapshot(),
            show_permission_alert: self.show_permission_alert,
            history: &self.history,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        matches!(
            self.run_state,
            MonitorRunState::Starting | MonitorRunState::Active
        )
    }

    pub fn run_state(&self) -> MonitorRunState {
        self.run_state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn current_floor(&self) -> i32 {
        self.current_floor
    }

    pub fn relative_altitude(&self) -> f64 {
        self.relative_altitude
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn baseline_altitude(&self) -> f64 {
        self.baseline_altitude
    }

    pub fn transport_type(&self) -> TransportType {
        self.transport_type
    }

    pub fn walking_floors(&self) -> i32 {
        self.walking_floors
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Label of the latest activity; `"stationary"` before any activity sample.
    pub fn activity_label(&self) -> &'static str {
        self.activity.unwrap_or(Activity::Stationary).label()
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn show_permission_alert(&self) -> bool {
        self.show_permission_alert
    }
}

impl FloorRecorder for FloorMonitor<'_> {
    fn history(&self) -> &ReadingHistory {
        &self.history
    }

    fn import_data(&mut self, bytes: &[u8]) -> bool {
        match self.history.try_import_json(bytes) {
            Ok(count) => {
                self.status_text = format!("Imported {} readings", count);
                info!("Imported {} readings", count);
                self.publish_snapshot();
                true
            }
            Err(e) => {
                self.status_text = format!("Import failed: {}", e);
                warn!("Import failed: {}", e);
                self.publish_snapshot();
                false
            }
        }
    }
}

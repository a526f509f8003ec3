//! Desktop trace replayer for the floor-rs transport classifier.
//!
//! Replays a scripted walk through a building (settle, flat walk, pause,
//! elevator, escalator, stairs) through floor-core's `FloorMonitor` and logs
//! every event the monitor publishes. No hardware or platform sensor APIs are
//! involved, so the classifier can be exercised end to end on a desktop.
//!
//! # Usage
//!
//! ```text
//! floor-simulator [CONFIG.json] [OUTPUT.json|OUTPUT.csv]
//! ```
//!
//! The optional config overrides floor height, thresholds and history size.
//! The recorded history is written to the output path, or to stdout as JSON.
//! Set `RUST_LOG=debug` to see every snapshot.

use std::env;
use std::fs;
use std::process::ExitCode;

use chrono::{DateTime, TimeDelta, Utc};
use embassy_sync::pubsub::WaitResult;
use log::{debug, error, info, warn};

use floor_core::config::{AVERAGE_FLOOR_HEIGHT_M, MonitorConfig};
use floor_core::events::{MonitorChannel, MonitorEvent, MonitorSubscriber};
use floor_core::sensors::{
    Activity, ActivitySample, AltitudeSample, DeviceCapabilities, PedometerSample,
};
use floor_core::{FloorMonitor, FloorRecorder};

// ---------------------------------------------------------------------------
// Trace constants
// ---------------------------------------------------------------------------

/// Simulated seconds between altimeter callbacks.
const SAMPLE_INTERVAL_SECS: i64 = 1;

/// Standard atmosphere at the ground floor.
const GROUND_PRESSURE_HPA: f64 = 1013.25;

/// Approximate pressure drop per metre near sea level.
const HPA_PER_METRE: f64 = 0.12;

const STEPS_PER_SECOND: u32 = 2;

/// Amplitude of the synthetic barometer jitter.
const ALTITUDE_NOISE_M: f64 = 0.08;

// ---------------------------------------------------------------------------
// Mock data generation
// ---------------------------------------------------------------------------

/// One leg of the scripted trace.
///
/// Step-counted floors are cumulative for the session, so the carried legs
/// (elevator, escalator) run before the stairs: once floors have been walked,
/// a later carried leg no longer shows zero step-counted floors.
struct Phase {
    name: &'static str,
    duration_secs: u32,
    /// Vertical speed, positive upwards
    climb_rate_m_s: f64,
    activity: Activity,
    /// Whether the pedometer counts the height change as floors
    on_foot: bool,
}

const SCRIPT: [Phase; 6] = [
    Phase {
        name: "settle",
        duration_secs: 5,
        climb_rate_m_s: 0.0,
        activity: Activity::Stationary,
        on_foot: false,
    },
    Phase {
        name: "corridor walk",
        duration_secs: 20,
        climb_rate_m_s: 0.0,
        activity: Activity::Walking,
        on_foot: false,
    },
    Phase {
        name: "pause",
        duration_secs: 10,
        climb_rate_m_s: 0.0,
        activity: Activity::Stationary,
        on_foot: false,
    },
    Phase {
        name: "elevator up",
        duration_secs: 12,
        climb_rate_m_s: 0.75,
        activity: Activity::Stationary,
        on_foot: false,
    },
    Phase {
        name: "escalator down",
        duration_secs: 30,
        climb_rate_m_s: -0.3,
        activity: Activity::Walking,
        on_foot: false,
    },
    Phase {
        name: "stairs up",
        duration_secs: 30,
        climb_rate_m_s: 0.2,
        activity: Activity::Walking,
        on_foot: true,
    },
];

/// Generates cumulative altimeter and pedometer samples for the script.
struct MockSensorGenerator {
    start: DateTime<Utc>,
    elapsed_secs: i64,
    altitude_m: f64,
    steps: u32,
    climbed_on_foot_m: f64,
    descended_on_foot_m: f64,
}

impl MockSensorGenerator {
    fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            elapsed_secs: 0,
            altitude_m: 0.0,
            steps: 0,
            climbed_on_foot_m: 0.0,
            descended_on_foot_m: 0.0,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.start + TimeDelta::seconds(self.elapsed_secs)
    }

    /// Advance one sample interval within `phase`.
    fn next_sample(&mut self, phase: &Phase) -> (PedometerSample, AltitudeSample) {
        self.elapsed_secs += SAMPLE_INTERVAL_SECS;

        let climb = phase.climb_rate_m_s * SAMPLE_INTERVAL_SECS as f64;
        self.altitude_m += climb;
        if phase.on_foot {
            if climb > 0.0 {
                self.climbed_on_foot_m += climb;
            } else {
                self.descended_on_foot_m -= climb;
            }
        }
        if phase.activity == Activity::Walking {
            self.steps += STEPS_PER_SECOND * SAMPLE_INTERVAL_SECS as u32;
        }

        let t = self.elapsed_secs as f64;
        let measured = self.altitude_m + ALTITUDE_NOISE_M * (t * 1.7).sin();
        let pressure = GROUND_PRESSURE_HPA - measured * HPA_PER_METRE;

        let pedometer = PedometerSample {
            steps: self.steps,
            floors_ascended: Some((self.climbed_on_foot_m / AVERAGE_FLOOR_HEIGHT_M) as u32),
            floors_descended: Some((self.descended_on_foot_m / AVERAGE_FLOOR_HEIGHT_M) as u32),
        };
        (pedometer, AltitudeSample::new(measured, pressure, self.now()))
    }
}

/// Feed every phase of [`SCRIPT`] into `monitor`, calling `after_sample`
/// after each altimeter update.
fn replay(
    monitor: &mut FloorMonitor<'_>,
    sensor_gen: &mut MockSensorGenerator,
    mut after_sample: impl FnMut(),
) {
    for phase in &SCRIPT {
        info!("Phase: {} ({} s)", phase.name, phase.duration_secs);
        monitor.on_activity(ActivitySample::only(phase.activity));

        for _ in 0..phase.duration_secs {
            let (pedometer, altitude) = sensor_gen.next_sample(phase);
            monitor.on_pedometer(pedometer);
            monitor.on_altitude(altitude);
            after_sample();
        }
        info!("  {}", monitor.status_text());
    }
}

// ---------------------------------------------------------------------------
// Event logging
// ---------------------------------------------------------------------------

fn drain_events(subscriber: &mut MonitorSubscriber<'_>) {
    while let Some(result) = subscriber.try_next_message() {
        match result {
            WaitResult::Lagged(missed) => warn!("Event subscriber lagged, missed {}", missed),
            WaitResult::Message(event) => log_event(&event),
        }
    }
}

fn log_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::Updated(snapshot) => debug!(
            "floor {:>3} | alt {:>6.2} m | {:>7.2} hPa | steps {:>4} | {}",
            snapshot.current_floor,
            snapshot.relative_altitude,
            snapshot.pressure,
            snapshot.total_steps,
            snapshot.status_text
        ),
        MonitorEvent::TransportChanged { from, to } => {
            info!(
                "Transport: {} -> {} ({})",
                from.display_name(),
                to.display_name(),
                to.description()
            )
        }
        MonitorEvent::BaselineLatched { baseline_altitude } => {
            info!("Baseline latched at {:.2} m", baseline_altitude)
        }
        MonitorEvent::Stopped => info!("Monitor stopped"),
        MonitorEvent::Reset => info!("Monitor reset"),
        MonitorEvent::SensorFailed(err) => warn!("Sensor failed: {}", err),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn load_config(path: Option<&str>) -> Option<MonitorConfig> {
    let Some(path) = path else {
        return Some(MonitorConfig::default());
    };
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Cannot read config {}: {}", path, e);
            return None;
        }
    };
    match MonitorConfig::from_json(&bytes) {
        Ok(config) => Some(config),
        Err(e) => {
            error!("Invalid config {}: {}", path, e);
            None
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(config) = load_config(args.first().map(String::as_str)) else {
        return ExitCode::FAILURE;
    };
    let output = args.get(1);

    info!("Starting floor-rs simulator");
    info!(
        "Floor height {:.1} m, stationary threshold {:.2} m, history {} readings",
        config.average_floor_height_m,
        config.classifier.stationary_threshold_m,
        config.history_capacity
    );

    let channel = MonitorChannel::new();
    let (Ok(publisher), Ok(mut subscriber)) = (channel.publisher(), channel.subscriber()) else {
        error!("Event channel has no free publisher or subscriber slot");
        return ExitCode::FAILURE;
    };
    let mut monitor = FloorMonitor::new(config).with_publisher(publisher);

    let mut sensor_gen = MockSensorGenerator::new(Utc::now());
    if let Err(e) = monitor.start(DeviceCapabilities::all(), sensor_gen.now()) {
        error!("Cannot start monitoring: {}", e);
        return ExitCode::FAILURE;
    }
    drain_events(&mut subscriber);

    replay(&mut monitor, &mut sensor_gen, || drain_events(&mut subscriber));

    monitor.stop();
    drain_events(&mut subscriber);

    // -----------------------------------------------------------------------
    // Report
    // -----------------------------------------------------------------------
    let stats = monitor.statistics();
    info!(
        "{} readings over {}, floors {}..={}, {} steps, mean |floor| {:.2}",
        stats.total_readings,
        stats.formatted_monitoring_time(),
        stats.min_floor,
        stats.max_floor,
        stats.total_steps,
        stats.average_floor_change
    );
    for transport_type in &stats.available_transport_types {
        info!(
            "  {:<10} {:>3}",
            transport_type.display_name(),
            stats.count_of(*transport_type)
        );
    }

    let summary = monitor.summary();
    info!(
        "Summary: climbed {}, descended {}, mostly {}, {}",
        summary.total_floors_climbed,
        summary.total_floors_descended,
        summary.most_used_transport.display_name(),
        summary.formatted_monitoring_time()
    );

    let exported = match monitor.export_data() {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // The export must load back into an identical history
    let mut replay = FloorMonitor::new(config);
    if !replay.import_data(&exported) || replay.statistics() != stats {
        error!("Exported history did not import cleanly: {}", replay.status_text());
        return ExitCode::FAILURE;
    }

    let result = match output {
        Some(path) if path.ends_with(".csv") => fs::write(path, monitor.history().export_csv()),
        Some(path) => fs::write(path, &exported),
        None => {
            println!("{}", String::from_utf8_lossy(&exported));
            Ok(())
        }
    };
    if let Err(e) = result {
        error!("Cannot write export: {}", e);
        return ExitCode::FAILURE;
    }
    if let Some(path) = output {
        info!("Wrote {} readings to {}", monitor.history().len(), path);
    }

    info!("Simulator exiting");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use floor_core::TransportType;

    #[test]
    fn test_script_covers_every_vertical_transport() {
        let mut monitor = FloorMonitor::new(MonitorConfig::default());
        let start = DateTime::from_timestamp(1_757_925_000, 0).unwrap();
        let mut sensor_gen = MockSensorGenerator::new(start);
        monitor.start(DeviceCapabilities::all(), sensor_gen.now()).unwrap();

        replay(&mut monitor, &mut sensor_gen, || {});

        for expected in [
            TransportType::Elevator,
            TransportType::Escalator,
            TransportType::Stairs,
        ] {
            assert!(
                monitor.history().filter_by(expected).next().is_some(),
                "no {} reading in the replay",
                expected
            );
        }
    }

    #[test]
    fn test_stairs_leg_counts_walked_floors() {
        let mut sensor_gen = MockSensorGenerator::new(Utc::now());
        let stairs = &SCRIPT[SCRIPT.len() - 1];
        let mut last = PedometerSample::default();
        for _ in 0..stairs.duration_secs {
            last = sensor_gen.next_sample(stairs).0;
        }
        assert!(last.walking_floors() >= 1);
        assert_eq!(last.steps, STEPS_PER_SECOND * stairs.duration_secs);
    }
}

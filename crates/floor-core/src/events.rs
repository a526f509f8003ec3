//! Monitor events published over an `embassy-sync` pub-sub channel
//!
//! The monitor publishes with `publish_immediate`, so a slow subscriber lags
//! (and sees `WaitResult::Lagged`) instead of blocking sensor updates.

use alloc::string::String;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};

use crate::classifier::TransportType;
use crate::sensors::SensorError;

/// Channel capacity for monitor events
/// Set to 8 to absorb bursts of altitude callbacks without blocking the update path
pub const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Number of subscribers that can listen to monitor events
/// - Subscriber 0: UI binding
/// - Subscriber 1: recorder / logger
pub const EVENT_SUBSCRIBERS: usize = 2;

/// Number of publishers (just the monitor)
pub const EVENT_PUBLISHERS: usize = 1;

/// Channel the monitor publishes on
pub type MonitorChannel = PubSubChannel<
    CriticalSectionRawMutex,
    MonitorEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

pub type MonitorPublisher<'a> = Publisher<
    'a,
    CriticalSectionRawMutex,
    MonitorEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

pub type MonitorSubscriber<'a> = Subscriber<
    'a,
    CriticalSectionRawMutex,
    MonitorEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

/// Immutable copy of the monitor's observable state.
///
/// Published after every sensor update so UI layers can refresh without
/// borrowing the monitor. The history itself is not copied; read it through
/// [`FloorMonitor::state`](crate::monitor::FloorMonitor::state).
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSnapshot {
    pub current_floor: i32,
    pub relative_altitude: f64,
    pub pressure: f64,
    pub is_monitoring: bool,
    pub status_text: String,
    pub transport_type: TransportType,
    pub walking_floors: i32,
    pub total_steps: u32,
    pub activity_label: &'static str,
    /// Number of readings currently held in the history
    pub history_len: usize,
}

/// Events published by the monitor to notify subscribers of new state
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Any observable field changed
    Updated(MonitorSnapshot),
    /// The classification differs from the previous reading's
    TransportChanged {
        from: TransportType,
        to: TransportType,
    },
    /// The baseline altitude was re-latched after the settle delay
    BaselineLatched { baseline_altitude: f64 },
    Stopped,
    Reset,
    /// A sensor failure stopped monitoring
    SensorFailed(SensorError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::pubsub::WaitResult;

    #[test]
    fn test_subscribers_receive_published_events() {
        let channel = MonitorChannel::new();
        let publisher = channel.publisher().unwrap();
        let mut ui = channel.subscriber().unwrap();
        let mut logger = channel.subscriber().unwrap();

        publisher.publish_immediate(MonitorEvent::Stopped);

        assert_eq!(ui.try_next_message_pure(), Some(MonitorEvent::Stopped));
        assert_eq!(logger.try_next_message_pure(), Some(MonitorEvent::Stopped));
        assert_eq!(ui.try_next_message_pure(), None);
    }

    #[test]
    fn test_slow_subscriber_lags_instead_of_blocking() {
        let channel = MonitorChannel::new();
        let publisher = channel.publisher().unwrap();
        let mut sub = channel.subscriber().unwrap();

        for _ in 0..EVENT_CHANNEL_CAPACITY + 2 {
            publisher.publish_immediate(MonitorEvent::Reset);
        }

        assert!(matches!(
            sub.try_next_message(),
            Some(WaitResult::Lagged(2))
        ));
    }
}

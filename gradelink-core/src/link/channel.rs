//! Per-channel sensor state
//!
//! The CAN receive path is the only writer of channel state and of the
//! response mailbox. Everything else reads. Each field is a separate atomic,
//! written value-first then timestamp, so a reader that sees a fresh
//! timestamp also sees the value that came with it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use gradelink_protocol::direction::codes;
use gradelink_protocol::messages::ID_HANDSHAKE_ACK;
use gradelink_protocol::{CanFrame, Direction, DistanceReport, SensorMode, SensorNode};
use portable_atomic::{AtomicBool, AtomicI16, AtomicU32, AtomicU8, Ordering};

use crate::status::{Status, StatusBus};

/// A channel that has been silent this long is unavailable
pub const SILENCE_WINDOW_MS: u32 = 3000;

/// Latest report from one sensor node
#[derive(Debug)]
pub struct SensorChannel {
    distance: AtomicI16,
    direction: AtomicU8,
    last_seen_ms: AtomicU32,
    seen: AtomicBool,
}

impl SensorChannel {
    pub const fn new() -> Self {
        Self {
            distance: AtomicI16::new(0),
            direction: AtomicU8::new(codes::MIDDLE),
            last_seen_ms: AtomicU32::new(0),
            seen: AtomicBool::new(false),
        }
    }

    fn record(&self, report: &DistanceReport, now_ms: u32) {
        self.distance.store(report.distance, Ordering::Relaxed);
        if let Some(direction) = report.direction {
            self.direction.store(direction.to_byte(), Ordering::Relaxed);
        }
        self.last_seen_ms.store(now_ms, Ordering::Release);
        self.seen.store(true, Ordering::Release);
    }

    fn is_fresh(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_seen_ms.load(Ordering::Acquire)) < SILENCE_WINDOW_MS
    }

    /// True for `SILENCE_WINDOW_MS` after the last report
    pub fn is_available(&self, now_ms: u32) -> bool {
        self.seen.load(Ordering::Acquire) && self.is_fresh(now_ms)
    }

    /// Forget a lapsed report
    ///
    /// Must run more often than the counter wraps, or the elapsed time
    /// wraps back into the window.
    fn expire(&self, now_ms: u32) {
        if self.seen.load(Ordering::Acquire) && !self.is_fresh(now_ms) {
            self.seen.store(false, Ordering::Release);
            // A report may have landed between the check and the store
            if self.is_fresh(now_ms) {
                self.seen.store(true, Ordering::Release);
            }
        }
    }

    /// Last reported distance (1/100 mm), whether or not still fresh
    pub fn distance(&self) -> i16 {
        self.distance.load(Ordering::Relaxed)
    }

    pub fn direction(&self) -> Direction {
        Direction::from_byte(self.direction.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Distance if the channel is available
    pub fn reading(&self, now_ms: u32) -> Option<i16> {
        self.is_available(now_ms).then(|| self.distance())
    }
}

impl Default for SensorChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// All sensor channels plus the depth-1 handshake response mailbox
pub struct SensorBank {
    channels: [SensorChannel; 3],
    response: Signal<CriticalSectionRawMutex, CanFrame>,
}

impl SensorBank {
    pub const fn new() -> Self {
        Self {
            channels: [SensorChannel::new(), SensorChannel::new(), SensorChannel::new()],
            response: Signal::new(),
        }
    }

    /// Handle one received frame
    ///
    /// Distance reports update their channel and clear a latched bus fault.
    /// Handshake acks replace whatever response is pending. Everything else
    /// is ignored.
    pub fn ingest(&self, frame: &CanFrame, now_ms: u32, bus: &StatusBus) {
        if let Some(report) = DistanceReport::from_frame(frame) {
            self.channel(report.node).record(&report, now_ms);
            if bus.is(Status::CanFault) {
                info!("CAN fault cleared");
                bus.reset(Status::CanFault);
            }
        } else if frame.id == ID_HANDSHAKE_ACK {
            self.response.signal(frame.clone());
        }
    }

    pub fn channel(&self, node: SensorNode) -> &SensorChannel {
        &self.channels[node.index()]
    }

    /// Mark channels whose window has lapsed as never seen
    pub fn expire_stale(&self, now_ms: u32) {
        for channel in &self.channels {
            channel.expire(now_ms);
        }
    }

    /// Take the pending handshake response, if any
    pub fn take_response(&self) -> Option<CanFrame> {
        self.response.try_take()
    }

    /// Drop any pending response before a new request goes out
    pub fn clear_response(&self) {
        self.response.reset();
    }

    /// Value the controller acts on for `mode`
    ///
    /// Single-sensor modes read the primary node. The multi-sensor mode
    /// averages whichever nodes are available.
    pub fn current_value(&self, mode: SensorMode, now_ms: u32) -> Option<i16> {
        if !mode.is_multi() {
            return self.channel(SensorNode::Primary).reading(now_ms);
        }

        let (sum, count) = mode
            .nodes()
            .iter()
            .filter_map(|node| self.channel(*node).reading(now_ms))
            .fold((0i32, 0i32), |(sum, count), value| (sum + value as i32, count + 1));

        (count > 0).then(|| (sum / count) as i16)
    }

    /// Number of `mode`'s nodes currently reporting
    pub fn available_count(&self, mode: SensorMode, now_ms: u32) -> usize {
        mode.nodes()
            .iter()
            .filter(|node| self.channel(**node).is_available(now_ms))
            .count()
    }

    /// Refresh `NoSensor` and `NoBigSki` for the requested mode
    pub fn update_statuses(&self, mode: SensorMode, now_ms: u32, bus: &StatusBus) {
        let available = self.available_count(mode, now_ms);
        let required = mode.nodes().len();

        let no_sensor = available == 0;
        if no_sensor != bus.is(Status::NoSensor) {
            if no_sensor {
                warn!("No sensor");
            } else {
                info!("Sensor connected");
            }
            bus.assign(Status::NoSensor, no_sensor);
        }

        bus.assign(
            Status::NoBigSki,
            mode.is_multi() && available > 0 && available < required,
        );
    }
}

impl Default for SensorBank {
    fn default() -> Self {
        Self::new()
    }
}

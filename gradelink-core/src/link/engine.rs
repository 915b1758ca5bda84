//! Sensor-link protocol engine
//!
//! Polled state machine that owns the controller side of the sensor link:
//!
//! ```text
//!   Init ──► BringUp ──► Idle ◄──────────────┐
//!               ▲         │ errors > 100     │
//!               └─────────┤                  │
//!                         │ mode/target ─► Handshake ─► commit / abort
//!                         │ 400 ms ──────► FeedbackGap ─► trailer
//! ```
//!
//! At most one frame goes out per tick. Timeouts and ack mismatches abort
//! back to `Idle` and bump the error counter; nothing is committed until
//! the whole handshake has been acked. A request made while a handshake is
//! running waits for the next `Idle` evaluation.

use gradelink_protocol::messages::{feedback_trailer, feedback_value};
use gradelink_protocol::{CanFrame, LinkRequest, SensorMode, BRING_UP_SEQUENCE};
use heapless::Vec;

use super::channel::SensorBank;
use crate::config::TARGETS_PER_MODE;
use crate::status::StatusBus;
use crate::timer::Timer;
use crate::traits::{BusError, FrameSink};

/// Per-step timeout for bring-up and handshake steps
pub const STEP_TIMEOUT_MS: u32 = 100;

/// Period of the feedback pair
pub const FEEDBACK_PERIOD_MS: u32 = 400;

/// Gap between the two feedback frames
pub const FEEDBACK_GAP_MS: u32 = 15;

/// Protocol errors tolerated before the bring-up sequence is replayed
pub const ERROR_THRESHOLD: u32 = 100;

/// Longest handshake: select, three targets, finalize
const MAX_REQUESTS: usize = 2 + TARGETS_PER_MODE;

/// Why a bring-up or handshake step was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AbortReason {
    /// No ack (or no free mailbox) within the step timeout
    Timeout,
    /// An ack arrived but did not match the request
    Mismatch,
    /// The CAN controller reported a bus fault on transmit
    Bus,
}

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Init,
    /// Next bring-up frame to send
    BringUp { step: usize },
    Idle,
    /// First feedback frame sent, trailer pending
    FeedbackGap,
    /// Handshake request `step` is being sent or awaits its ack
    Handshake { step: usize, sent: bool },
}

/// Mode and targets a handshake is programming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    mode: SensorMode,
    targets: [i16; TARGETS_PER_MODE],
}

impl Snapshot {
    fn requests(&self) -> Vec<LinkRequest, MAX_REQUESTS> {
        let mut requests = Vec::new();
        let _ = requests.push(LinkRequest::SelectMode(self.mode));
        if self.mode.is_multi() {
            for (node, target) in self.targets.iter().enumerate() {
                let _ = requests.push(LinkRequest::SetTarget {
                    node: node as u8,
                    target: *target,
                });
            }
            let _ = requests.push(LinkRequest::FinalizeMulti);
        } else {
            let _ = requests.push(LinkRequest::SetTarget {
                node: 0,
                target: self.targets[0],
            });
            let _ = requests.push(LinkRequest::Finalize);
        }
        requests
    }
}

pub struct SensorLink {
    state: LinkState,
    requested: Snapshot,
    /// `None` until the first handshake succeeds
    current: Option<Snapshot>,
    /// What the running handshake is programming
    pending: Snapshot,
    requests: Vec<LinkRequest, MAX_REQUESTS>,
    error_count: u32,
    step_timer: Timer,
    feedback_timer: Timer,
    gap_timer: Timer,
    feedback_value: i16,
}

impl SensorLink {
    pub fn new(mode: SensorMode, targets: [i16; TARGETS_PER_MODE]) -> Self {
        let requested = Snapshot { mode, targets };
        Self {
            state: LinkState::Init,
            requested,
            current: None,
            pending: requested,
            requests: Vec::new(),
            error_count: 0,
            step_timer: Timer::new(STEP_TIMEOUT_MS),
            feedback_timer: Timer::new(FEEDBACK_PERIOD_MS),
            gap_timer: Timer::new(FEEDBACK_GAP_MS),
            feedback_value: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn requested_mode(&self) -> SensorMode {
        self.requested.mode
    }

    pub fn requested_targets(&self) -> [i16; TARGETS_PER_MODE] {
        self.requested.targets
    }

    /// Mode the sensor unit was last successfully programmed with
    pub fn current_mode(&self) -> Option<SensorMode> {
        self.current.map(|current| current.mode)
    }

    /// Targets the sensor unit was last successfully programmed with
    pub fn current_targets(&self) -> Option<[i16; TARGETS_PER_MODE]> {
        self.current.map(|current| current.targets)
    }

    /// True when the sensor unit runs the requested mode and targets
    pub fn is_synced(&self) -> bool {
        self.current == Some(self.requested)
    }

    /// Ask for a mode change; sent at the next idle evaluation
    pub fn request_mode(&mut self, mode: SensorMode) {
        self.requested.mode = mode;
    }

    /// Ask for new targets; sent at the next idle evaluation
    pub fn request_targets(&mut self, targets: [i16; TARGETS_PER_MODE]) {
        self.requested.targets = targets;
    }

    /// Value carried by the next feedback frame
    pub fn set_feedback_value(&mut self, value: i16) {
        self.feedback_value = value;
    }

    /// Advance the engine by one step
    pub fn tick<S: FrameSink>(
        &mut self,
        now_ms: u32,
        sink: &mut S,
        sensors: &SensorBank,
        bus: &StatusBus,
    ) {
        sensors.update_statuses(self.requested.mode, now_ms, bus);

        match self.state {
            LinkState::Init => self.start_bring_up(now_ms),
            LinkState::BringUp { step } => self.bring_up_step(step, now_ms, sink),
            LinkState::Idle => self.idle(now_ms, sink, sensors),
            LinkState::FeedbackGap => {
                if self.gap_timer.has_elapsed(now_ms) {
                    if let Err(error) = sink.try_transmit(&feedback_trailer()) {
                        debug!("Feedback trailer dropped: {:?}", error);
                    }
                    self.state = LinkState::Idle;
                }
            }
            LinkState::Handshake { step, sent } => {
                self.handshake_step(step, sent, now_ms, sink, sensors)
            }
        }
    }

    fn start_bring_up(&mut self, now_ms: u32) {
        info!("Link bring-up");
        self.step_timer.start(now_ms);
        self.state = LinkState::BringUp { step: 0 };
    }

    fn bring_up_step<S: FrameSink>(&mut self, step: usize, now_ms: u32, sink: &mut S) {
        if self.step_timer.has_elapsed(now_ms) {
            self.abort(AbortReason::Timeout);
            return;
        }
        let Some(frame) = BRING_UP_SEQUENCE.get(step) else {
            self.finish_bring_up();
            return;
        };

        match sink.try_transmit(&frame.to_frame()) {
            Ok(()) => {
                self.step_timer.start(now_ms);
                if step + 1 == BRING_UP_SEQUENCE.len() {
                    self.finish_bring_up();
                } else {
                    self.state = LinkState::BringUp { step: step + 1 };
                }
            }
            // Mailboxes full; retried next tick until the step times out
            Err(BusError::Busy) => {}
            Err(BusError::Fault) => self.abort(AbortReason::Bus),
        }
    }

    fn finish_bring_up(&mut self) {
        info!("Link bring-up done");
        self.error_count = 0;
        self.state = LinkState::Idle;
    }

    fn idle<S: FrameSink>(&mut self, now_ms: u32, sink: &mut S, sensors: &SensorBank) {
        if self.error_count > ERROR_THRESHOLD {
            warn!("{} link errors, replaying bring-up", self.error_count);
            self.start_bring_up(now_ms);
            return;
        }

        if !self.is_synced() {
            self.start_handshake(now_ms);
            return;
        }

        if self.feedback_timer.has_elapsed(now_ms) {
            self.feedback_timer.start(now_ms);
            match sink.try_transmit(&feedback_value(self.feedback_value)) {
                Ok(()) => {
                    self.gap_timer.start(now_ms);
                    self.state = LinkState::FeedbackGap;
                }
                Err(error) => debug!("Feedback dropped: {:?}", error),
            }
            return;
        }

        // No request is outstanding at Idle, so any response here is stale
        if let Some(frame) = sensors.take_response() {
            debug!("Stray response {=u16:#x} discarded", frame.id);
        }
    }

    fn start_handshake(&mut self, now_ms: u32) {
        self.pending = self.requested;
        self.requests = self.pending.requests();
        info!("Handshake for {:?}", self.pending.mode);
        self.enter_step(0, now_ms);
    }

    fn enter_step(&mut self, step: usize, now_ms: u32) {
        self.step_timer.start(now_ms);
        self.state = LinkState::Handshake { step, sent: false };
    }

    fn handshake_step<S: FrameSink>(
        &mut self,
        step: usize,
        sent: bool,
        now_ms: u32,
        sink: &mut S,
        sensors: &SensorBank,
    ) {
        let Some(request) = self.requests.get(step).copied() else {
            self.commit();
            return;
        };

        if !sent {
            sensors.clear_response();
            match sink.try_transmit(&request.to_frame()) {
                Ok(()) => {
                    trace!("Sent {:?}", request);
                    self.step_timer.start(now_ms);
                    self.state = LinkState::Handshake { step, sent: true };
                }
                Err(BusError::Busy) if !self.step_timer.has_elapsed(now_ms) => {}
                Err(BusError::Busy) => self.abort(AbortReason::Timeout),
                Err(BusError::Fault) => self.abort(AbortReason::Bus),
            }
            return;
        }

        match sensors.take_response() {
            Some(response) if request.is_acked_by(&response) => {
                if step + 1 == self.requests.len() {
                    self.commit();
                } else {
                    self.enter_step(step + 1, now_ms);
                }
            }
            Some(_) => self.abort(AbortReason::Mismatch),
            None if self.step_timer.has_elapsed(now_ms) => self.abort(AbortReason::Timeout),
            None => {}
        }
    }

    fn commit(&mut self) {
        info!("Handshake done for {:?}", self.pending.mode);
        self.current = Some(self.pending);
        self.error_count = 0;
        self.state = LinkState::Idle;
    }

    fn abort(&mut self, reason: AbortReason) {
        self.error_count = self.error_count.saturating_add(1);
        warn!(
            "Link step aborted in {:?}: {:?} ({} errors)",
            self.state, reason, self.error_count
        );
        self.state = LinkState::Idle;
    }
}

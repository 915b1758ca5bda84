//! Work-delay line
//!
//! Readings are sampled at a fixed cadence into a bounded delay line. The
//! newest sample is the "real" value shown to the operator; the oldest is
//! the value the control policy acts on, so the plate reacts to terrain
//! `work_delay_s` seconds after the sensor has passed over it.

use heapless::Deque;

/// Sampling cadence of the delay line
pub const SAMPLE_PERIOD_MS: u32 = 100;

/// Samples per second of work delay
pub const SAMPLES_PER_SECOND: usize = (1000 / SAMPLE_PERIOD_MS) as usize;

/// Longest delay line
pub const CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct DelayLine {
    samples: Deque<i16, CAPACITY>,
    length: usize,
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayLine {
    pub const fn new() -> Self {
        Self {
            samples: Deque::new(),
            length: 1,
        }
    }

    /// Number of samples for a work delay in seconds
    pub fn length_for(work_delay_s: u8) -> usize {
        (work_delay_s as usize * SAMPLES_PER_SECOND).clamp(1, CAPACITY)
    }

    /// Newest sample
    pub fn real(&self) -> Option<i16> {
        self.samples.front().copied()
    }

    /// Oldest sample
    pub fn filtered(&self) -> Option<i16> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Add a sample, dropping the oldest once the line is full
    pub fn push(&mut self, value: i16) {
        while self.samples.len() >= self.length {
            self.samples.pop_back();
        }
        // Cannot fail: length <= CAPACITY and we just made room
        let _ = self.samples.push_front(value);
    }

    /// Fill a line of `length` samples with the current real value
    pub fn refill(&mut self, length: usize) {
        self.length = length.clamp(1, CAPACITY);
        let Some(last) = self.real() else {
            self.samples.clear();
            return;
        };
        self.samples.clear();
        for _ in 0..self.length {
            let _ = self.samples.push_front(last);
        }
    }

    /// Keep only the current real value
    pub fn collapse(&mut self) {
        self.refill(1);
    }
}

//! Dispatch clock
//!
//! Derives the 1 kHz dispatch tick from the sample clock. The real-time
//! context renders one sample per step and runs the dispatcher first on
//! the steps where a millisecond boundary falls.

/// Dispatch ticks per second
pub const DISPATCH_RATE: u32 = 1_000;

/// Fractional millisecond tracker in sample units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchClock {
    sample_rate: u32,
    /// Accumulated ms * sample_rate remainder
    acc: u32,
    /// Total dispatch ticks fired
    ticks: u64,
}

impl DispatchClock {
    /// Create a clock for `sample_rate`
    ///
    /// The first dispatch fires on the first sample, so commands queued
    /// before start apply before anything is rendered.
    pub fn new(sample_rate: u32) -> Self {
        DispatchClock {
            sample_rate: sample_rate.max(DISPATCH_RATE),
            acc: sample_rate.max(DISPATCH_RATE),
            ticks: 0,
        }
    }

    /// Clock by one sample; returns true if a dispatch tick falls here
    #[inline]
    pub fn clock(&mut self) -> bool {
        self.acc += DISPATCH_RATE;
        if self.acc > self.sample_rate {
            self.acc -= self.sample_rate;
            self.ticks += 1;
            true
        } else {
            false
        }
    }

    /// Whether the next [`DispatchClock::clock`] will fire
    #[inline]
    pub fn fires_next(&self) -> bool {
        self.acc + DISPATCH_RATE > self.sample_rate
    }

    /// Dispatch ticks fired so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Average samples per dispatch tick
    pub fn samples_per_tick(&self) -> f64 {
        self.sample_rate as f64 / DISPATCH_RATE as f64
    }

    /// Start over
    pub fn reset(&mut self) {
        self.acc = self.sample_rate;
        self.ticks = 0;
    }
}

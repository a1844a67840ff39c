//! Global tick counter
//!
//! Free-running millisecond counter advanced by the dispatcher and read by
//! the producer to stamp packets. Only the low 16 bits are meaningful to
//! packets; readiness is decided by signed 16-bit difference.

use std::sync::atomic::{AtomicU32, Ordering};

/// Largest delay the producer may request
///
/// Anything further ahead would read as "in the past" through the signed
/// 16-bit comparison.
pub const MAX_DELAY_TICKS: u16 = i16::MAX as u16;

/// Millisecond counter shared between the two contexts
#[derive(Debug, Default)]
pub struct TickCounter {
    ticks: AtomicU32,
}

impl TickCounter {
    /// Start at tick 0
    pub const fn new() -> Self {
        TickCounter {
            ticks: AtomicU32::new(0),
        }
    }

    /// Start at an arbitrary tick (wraparound testing)
    pub const fn starting_at(tick: u16) -> Self {
        TickCounter {
            ticks: AtomicU32::new(tick as u32),
        }
    }

    /// Current tick, modulo 65536
    #[inline]
    pub fn now(&self) -> u16 {
        self.ticks.load(Ordering::Acquire) as u16
    }

    /// Ticks elapsed since start (wraps after ~49 days)
    pub fn elapsed(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Advance by one tick and return the new value (dispatcher only)
    #[inline]
    pub fn advance(&self) -> u16 {
        self.ticks.fetch_add(1, Ordering::AcqRel).wrapping_add(1) as u16
    }

    /// Target tick for a packet delayed by `delay` ticks
    #[inline]
    pub fn stamp(&self, delay: u16) -> u16 {
        self.now().wrapping_add(delay.min(MAX_DELAY_TICKS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps() {
        let ticks = TickCounter::starting_at(0xFFFF);
        assert_eq!(ticks.now(), 0xFFFF);
        assert_eq!(ticks.advance(), 0);
        assert_eq!(ticks.now(), 0);
    }

    #[test]
    fn test_stamp_clamps_delay() {
        let ticks = TickCounter::starting_at(100);
        assert_eq!(ticks.stamp(5), 105);
        assert_eq!(ticks.stamp(u16::MAX), 100u16.wrapping_add(MAX_DELAY_TICKS));
    }
}

//! Envelope Generator
//!
//! State machine over {Rising, Falling} x {Running, Stopped}, stepping the
//! level 0-15 once per elapsed envelope period. The shape register (R13)
//! bits keep their classical meaning so content authored for the original
//! chip sounds the same:
//!
//! | bit | name | effect at the end of a ramp |
//! |---|---|---|
//! | 3 | continue | 0: drop to 0 and stop |
//! | 2 | attack | initial direction (1 = rising from 0) |
//! | 1 | alternate | reverse direction instead of restarting |
//! | 0 | hold | stop, at 15 if `attack ^ alternate` else 0 |
//!
//! The bound check happens on the step after a bound is reached, so every
//! level is held for exactly one period.

use bitflags::bitflags;
use std::fmt;

/// Highest envelope level
pub const ENVELOPE_MAX: u8 = 15;

/// Upper bound on steps taken in one sample tick
const MAX_STEPS_PER_SAMPLE: u64 = 64;

bitflags! {
    /// Envelope Shape Control - Register R13
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EnvelopeShape: u8 {
        /// Stop at the end of the first ramp
        const HOLD = 0x01;
        /// Reverse direction at each bound
        const ALTERNATE = 0x02;
        /// Start rising from 0
        const ATTACK = 0x04;
        /// Keep running after the first ramp
        const CONTINUE = 0x08;
    }
}

impl EnvelopeShape {
    /// Create from raw register value (upper nibble ignored)
    pub fn from_register(value: u8) -> Self {
        EnvelopeShape::from_bits_truncate(value & 0x0F)
    }

    /// Whether the first ramp rises
    #[inline]
    pub fn attack(&self) -> bool {
        self.contains(EnvelopeShape::ATTACK)
    }

    /// Level the generator freezes at when `hold` stops it
    #[inline]
    pub fn hold_level(&self) -> u8 {
        if self.attack() != self.contains(EnvelopeShape::ALTERNATE) {
            ENVELOPE_MAX
        } else {
            0
        }
    }
}

impl fmt::Display for EnvelopeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.bits() {
            0x00..=0x03 | 0x09 => "Decay-Off",
            0x04..=0x07 | 0x0F => "Attack-Off",
            0x08 => "Sawtooth-Down",
            0x0A => "Triangle-Down",
            0x0B => "Decay-Hold",
            0x0C => "Sawtooth-Up",
            0x0D => "Attack-Hold",
            0x0E => "Triangle-Up",
            _ => "?",
        };
        write!(f, "{name}")
    }
}

/// Running state of one envelope generator
///
/// Shape and period are owned by the chip and shared; the generator only
/// tracks where it is on the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeGen {
    level: u8,
    rising: bool,
    running: bool,
    /// Fraction of the current period elapsed (32-bit fixed point)
    acc: u32,
}

impl EnvelopeGen {
    /// Create a stopped generator at level 0
    pub const fn new() -> Self {
        EnvelopeGen {
            level: 0,
            rising: false,
            running: false,
            acc: 0,
        }
    }

    /// Restart from the attack edge of `shape`
    pub fn restart(&mut self, shape: EnvelopeShape) {
        self.rising = shape.attack();
        self.level = if self.rising { 0 } else { ENVELOPE_MAX };
        self.running = true;
        self.acc = 0;
    }

    /// Advance by one envelope period
    pub fn step(&mut self, shape: EnvelopeShape) {
        if !self.running {
            return;
        }

        let at_bound = if self.rising {
            self.level == ENVELOPE_MAX
        } else {
            self.level == 0
        };

        if !at_bound {
            if self.rising {
                self.level += 1;
            } else {
                self.level -= 1;
            }
            return;
        }

        if !shape.contains(EnvelopeShape::CONTINUE) {
            self.level = 0;
            self.running = false;
        } else if shape.contains(EnvelopeShape::HOLD) {
            self.level = shape.hold_level();
            self.running = false;
        } else if shape.contains(EnvelopeShape::ALTERNATE) {
            // the bound level opens the reversed ramp
            self.rising = !self.rising;
        } else {
            self.level = if shape.attack() { 0 } else { ENVELOPE_MAX };
        }
    }

    /// Advance by one sample tick
    ///
    /// `increment` is the number of envelope periods per sample in 32.32
    /// fixed point; several steps may elapse in one sample for short periods.
    #[inline]
    pub fn clock(&mut self, shape: EnvelopeShape, increment: u64) {
        if !self.running {
            return;
        }
        let total = self.acc as u64 + increment;
        self.acc = total as u32;
        let steps = (total >> 32).min(MAX_STEPS_PER_SAMPLE);
        for _ in 0..steps {
            self.step(shape);
            if !self.running {
                break;
            }
        }
    }

    /// Current level (0-15)
    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Whether the level is still moving
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current direction
    #[inline]
    pub fn is_rising(&self) -> bool {
        self.rising
    }
}

impl Default for EnvelopeGen {
    fn default() -> Self {
        Self::new()
    }
}

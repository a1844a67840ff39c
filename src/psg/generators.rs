//! Sound generators
//!
//! This module contains the per-sample signal sources:
//! - Tone oscillator (32-bit phase accumulator, four waveforms)
//! - Vibrato LFO (advanced at the 1 kHz dispatch rate)
//! - Noise generator (shared 17-bit LFSR)

use crate::psg::tables::{CENT_RATIO_Q32, CHANNEL_MAX};
use crate::queue::Waveform;

/// Largest phase increment (half the sample rate)
pub const MAX_PHASE_INC: u32 = 1 << 31;

/// Tone phase increment for a 12-bit period
///
/// `f = chip_clock / (32 * period)`, `inc = f / sample_rate * 2^32`.
/// Period 0 is silence (increment 0) and the result never exceeds Nyquist.
pub fn tone_increment(period: u16, chip_clock: u32, sample_rate: u32) -> u32 {
    if period == 0 || sample_rate == 0 {
        return 0;
    }
    let num = (chip_clock as u64) << 32;
    let den = 32 * period as u64 * sample_rate as u64;
    (num / den).min(MAX_PHASE_INC as u64) as u32
}

/// Envelope periods elapsed per sample, 32.32 fixed point
///
/// One envelope step lasts `32 * period` chip clocks; period 0 counts as 1.
pub fn envelope_increment(period: u16, chip_clock: u32, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    let den = 32 * period.max(1) as u64 * sample_rate as u64;
    ((chip_clock as u64) << 32) / den
}

/// Sample value (0..=4095) of `wave` at `phase`
#[inline]
pub fn waveform_sample(wave: Waveform, phase: u32) -> u32 {
    match wave {
        Waveform::Square => {
            if phase & 0x8000_0000 != 0 {
                CHANNEL_MAX
            } else {
                0
            }
        }
        Waveform::Triangle => {
            let p = phase >> 19;
            if p < 4096 {
                p
            } else {
                8191 - p
            }
        }
        Waveform::Sawtooth => phase >> 20,
        Waveform::InverseSawtooth => CHANNEL_MAX - (phase >> 20),
    }
}

/// Tone oscillator for a single channel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToneGenerator {
    /// Current phase (full turn = 2^32)
    phase: u32,
    /// Base increment derived from the period registers
    increment: u32,
}

impl ToneGenerator {
    /// Create a silent oscillator
    pub const fn new() -> Self {
        ToneGenerator {
            phase: 0,
            increment: 0,
        }
    }

    /// Set the period from register values
    #[inline]
    pub fn set_period(&mut self, period: u16, chip_clock: u32, sample_rate: u32) {
        self.increment = tone_increment(period, chip_clock, sample_rate);
    }

    /// Base increment (without vibrato)
    #[inline]
    pub fn increment(&self) -> u32 {
        self.increment
    }

    /// Current phase
    #[inline]
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Sample at the current phase, then advance by `increment`
    #[inline]
    pub fn tick(&mut self, wave: Waveform, increment: u32) -> u32 {
        let out = waveform_sample(wave, self.phase);
        self.phase = self.phase.wrapping_add(increment);
        out
    }
}

/// Vibrato LFO for one channel
///
/// Depth is in cents (0..=127), rate in tenths of a hertz. The phase only
/// moves on dispatch ticks, so the modulation is a staircase at 1 kHz.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Vibrato {
    depth: u8,
    rate: u8,
    phase: u32,
}

impl Vibrato {
    /// Largest depth in cents
    pub const MAX_DEPTH: u8 = 127;

    /// Create a disabled LFO
    pub const fn new() -> Self {
        Vibrato {
            depth: 0,
            rate: 0,
            phase: 0,
        }
    }

    /// Configure depth (clamped to [`Vibrato::MAX_DEPTH`]) and rate
    pub fn set(&mut self, depth: u8, rate: u8) {
        self.depth = depth.min(Self::MAX_DEPTH);
        self.rate = rate;
    }

    /// Depth in cents
    #[inline]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Rate in tenths of a hertz
    #[inline]
    pub fn rate(&self) -> u8 {
        self.rate
    }

    /// Whether the LFO modulates anything
    #[inline]
    pub fn is_active(&self) -> bool {
        self.depth != 0 && self.rate != 0
    }

    /// Advance by one millisecond
    #[inline]
    pub fn tick(&mut self) {
        let step = ((self.rate as u64) << 32) / 10_000;
        self.phase = self.phase.wrapping_add(step as u32);
    }

    /// Signed triangle in Q15, zero at phase 0 and rising first
    #[inline]
    pub fn triangle(&self) -> i32 {
        let p = (self.phase.wrapping_add(0x4000_0000) >> 16) as i32;
        if p < 0x8000 {
            p * 2 - 0x8000
        } else {
            (0xFFFF - p) * 2 - 0x8000
        }
    }

    /// Apply the current deviation to a base increment
    #[inline]
    pub fn modulate(&self, increment: u32) -> u32 {
        if !self.is_active() || increment == 0 {
            return increment;
        }
        let cents_q8 = (self.depth as i64 * self.triangle() as i64) >> 7;
        let delta = (increment as i128 * cents_q8 as i128 * CENT_RATIO_Q32 as i128) >> 40;
        (increment as i128 + delta).clamp(0, MAX_PHASE_INC as i128) as u32
    }
}

/// Noise generator using a 17-bit LFSR
///
/// Steps at `chip_clock / (32 * period)` per second, at most once per sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoiseGenerator {
    /// Samples left until the next LFSR step
    counter: u32,
    /// Samples per LFSR step
    reload: u32,
    /// 17-bit LFSR state
    lfsr: u32,
}

impl NoiseGenerator {
    /// Create a new noise generator
    pub const fn new() -> Self {
        NoiseGenerator {
            counter: 1,
            reload: 1,
            lfsr: 1, // Must be non-zero
        }
    }

    /// Set the period from register R6 (0 behaves as 1)
    pub fn set_period(&mut self, period: u8, chip_clock: u32, sample_rate: u32) {
        let period = period.max(1) as u64;
        let clock = (chip_clock as u64).max(1);
        let samples = (period * 32 * sample_rate as u64 + clock / 2) / clock;
        self.reload = samples.clamp(1, u32::MAX as u64) as u32;
        self.counter = self.counter.min(self.reload);
    }

    /// Samples per LFSR step
    #[inline]
    pub fn reload(&self) -> u32 {
        self.reload
    }

    /// Current output bit
    #[inline]
    pub fn output(&self) -> bool {
        self.lfsr & 1 != 0
    }

    /// Advance by one sample, returns the output bit
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.counter -= 1;
        if self.counter == 0 {
            self.counter = self.reload;
            let bit = (self.lfsr ^ (self.lfsr >> 3)) & 1;
            self.lfsr = (self.lfsr >> 1) | (bit << 16);
        }
        self.output()
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_increment_a440() {
        // 2 MHz / (32 * 142) = 440.14 Hz
        let inc = tone_increment(142, 2_000_000, 22_050);
        assert_eq!(inc, 85_731_997);
        let freq = inc as f64 / 4_294_967_296.0 * 22_050.0;
        approx::assert_abs_diff_eq!(freq, 440.14, epsilon = 0.01);
    }

    #[test]
    fn test_tone_increment_limits() {
        assert_eq!(tone_increment(0, 2_000_000, 22_050), 0);
        assert_eq!(tone_increment(1, 2_000_000, 22_050), MAX_PHASE_INC);
        assert!(tone_increment(4095, 2_000_000, 22_050) > 0);
    }

    #[test]
    fn test_envelope_increment_treats_zero_as_one() {
        assert_eq!(
            envelope_increment(0, 2_000_000, 22_050),
            envelope_increment(1, 2_000_000, 22_050)
        );
    }

    #[test]
    fn test_waveform_ranges() {
        for wave in [
            Waveform::Square,
            Waveform::Triangle,
            Waveform::Sawtooth,
            Waveform::InverseSawtooth,
        ] {
            for i in 0..=256u64 {
                let phase = ((i << 32) / 256).min(u32::MAX as u64) as u32;
                assert!(waveform_sample(wave, phase) <= CHANNEL_MAX);
            }
        }
        assert_eq!(waveform_sample(Waveform::Triangle, 0x8000_0000), 4095);
        assert_eq!(waveform_sample(Waveform::Sawtooth, u32::MAX), 4095);
        assert_eq!(waveform_sample(Waveform::InverseSawtooth, 0), 4095);
    }

    #[test]
    fn test_square_period_in_samples() {
        let mut tone = ToneGenerator::new();
        tone.set_period(142, 2_000_000, 22_050);
        let mut rising = Vec::new();
        let mut last = 0;
        for n in 0..2000 {
            let s = tone.tick(Waveform::Square, tone.increment());
            if s > last {
                rising.push(n);
            }
            last = s;
        }
        for pair in rising.windows(2) {
            let gap = pair[1] - pair[0];
            assert!((49..=51).contains(&gap), "gap {gap}");
        }
    }

    #[test]
    fn test_vibrato_bounds() {
        let base = tone_increment(142, 2_000_000, 22_050);
        let mut lfo = Vibrato::new();
        lfo.set(200, 50);
        assert_eq!(lfo.depth(), Vibrato::MAX_DEPTH);

        let (mut lo, mut hi) = (u32::MAX, 0);
        for _ in 0..1000 {
            lfo.tick();
            let inc = lfo.modulate(base);
            lo = lo.min(inc);
            hi = hi.max(inc);
        }
        // +-127 cents is roughly +-7.3% with the linear approximation
        let span = base as f64 * 0.08;
        assert!((hi as f64) < base as f64 + span);
        assert!((lo as f64) > base as f64 - span);
        assert!(hi > base && lo < base);
    }

    #[test]
    fn test_vibrato_inactive_is_identity() {
        let mut lfo = Vibrato::new();
        lfo.set(50, 0);
        lfo.tick();
        assert_eq!(lfo.modulate(1234567), 1234567);
    }

    #[test]
    fn test_noise_lfsr_sequence() {
        let mut noise = NoiseGenerator::new();
        noise.set_period(1, 2_000_000, 22_050);
        assert_eq!(noise.reload(), 1);

        let mut ones = 0;
        for _ in 0..10_000 {
            if noise.tick() {
                ones += 1;
            }
        }
        assert!((3_000..7_000).contains(&ones), "ones = {ones}");
    }

    #[test]
    fn test_noise_reload_scales_with_period() {
        let mut noise = NoiseGenerator::new();
        noise.set_period(31, 2_000_000, 22_050);
        // 31 * 32 * 22050 / 2e6 = 10.94
        assert_eq!(noise.reload(), 11);
        noise.set_period(0, 2_000_000, 22_050);
        assert_eq!(noise.reload(), 1);
    }
}

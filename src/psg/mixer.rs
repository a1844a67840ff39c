//! Output Mixer
//!
//! Gates each channel with the mixer control register (R7), scales it by its
//! amplitude, splits it across the stereo field and compresses the sums back
//! into the 12-bit output range.

use bitflags::bitflags;

use crate::psg::tables::{soft_clip, CHANNEL_MAX, PAN_CENTER, PAN_LEFT, PAN_RIGHT};

bitflags! {
    /// Mixer Control Register (R7) bitflags
    ///
    /// A set bit disables the source.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MixerFlags: u8 {
        /// Channel A tone disable
        const CH_A_TONE = 0x01;
        /// Channel B tone disable
        const CH_B_TONE = 0x02;
        /// Channel C tone disable
        const CH_C_TONE = 0x04;
        /// Channel A noise disable
        const CH_A_NOISE = 0x08;
        /// Channel B noise disable
        const CH_B_NOISE = 0x10;
        /// Channel C noise disable
        const CH_C_NOISE = 0x20;
    }
}

impl MixerFlags {
    /// Create mixer flags from raw register value
    pub fn from_register(value: u8) -> Self {
        MixerFlags::from_bits_truncate(value)
    }

    /// Check if the tone of `channel` (0-2) is enabled
    #[inline]
    pub fn tone_enabled(&self, channel: usize) -> bool {
        self.bits() & (0x01 << channel) == 0
    }

    /// Check if the noise of `channel` (0-2) is enabled
    #[inline]
    pub fn noise_enabled(&self, channel: usize) -> bool {
        self.bits() & (0x08 << channel) == 0
    }

    /// Gate a channel's waveform value
    ///
    /// `(tone | tone_off) & (noise | noise_off)`: a disabled source holds its
    /// input high, so a channel with both disabled outputs full-scale DC.
    #[inline]
    pub fn gate(&self, channel: usize, wave: u32, noise: bool) -> u32 {
        let tone = if self.tone_enabled(channel) {
            wave
        } else {
            CHANNEL_MAX
        };
        if self.noise_enabled(channel) && !noise {
            0
        } else {
            tone
        }
    }
}

impl Default for MixerFlags {
    /// Everything disabled, the power-on state
    fn default() -> Self {
        MixerFlags::all()
    }
}

/// Stereo accumulator for one output sample pair
#[derive(Debug, Clone, Copy, Default)]
pub struct StereoMix {
    left: u32,
    right: u32,
}

impl StereoMix {
    /// Start an empty sample pair
    pub const fn new() -> Self {
        StereoMix { left: 0, right: 0 }
    }

    /// Add a channel amplitude (0..=4095) at `pan` (1-15)
    ///
    /// Out-of-range pan values fall back to center.
    #[inline]
    pub fn add(&mut self, amplitude: u32, pan: u8) {
        let pan = if (1..=15).contains(&pan) {
            pan as usize
        } else {
            PAN_CENTER as usize
        };
        self.left += (amplitude * PAN_LEFT[pan] as u32) >> 12;
        self.right += (amplitude * PAN_RIGHT[pan] as u32) >> 12;
    }

    /// Raw left sum before compression
    #[inline]
    pub fn left(&self) -> u32 {
        self.left
    }

    /// Raw right sum before compression
    #[inline]
    pub fn right(&self) -> u32 {
        self.right
    }

    /// Compress both sums into 12-bit output samples
    #[inline]
    pub fn finish(self) -> (u16, u16) {
        (soft_clip(self.left), soft_clip(self.right))
    }
}

//! Register Definitions
//!
//! The 14 registers (R0-R13) of the classic 3-voice chip, bit-exact with
//! the original layout. The I/O port registers are not modelled.

use std::fmt;

/// Number of sound registers
pub const REGISTER_COUNT: usize = 14;

/// Valid bits of each register
pub const REG_MASK: [u8; REGISTER_COUNT] = [
    0xFF, 0x0F, // tone A period (12 bits)
    0xFF, 0x0F, // tone B period
    0xFF, 0x0F, // tone C period
    0x1F, // noise period (5 bits)
    0x3F, // mixer (6 bits)
    0x1F, 0x1F, 0x1F, // volumes (level + envelope select)
    0xFF, 0xFF, // envelope period (16 bits)
    0x0F, // envelope shape
];

/// Register Address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Channel A Frequency (low byte) - R0
    ChAFreqLo = 0x00,
    /// Channel A Frequency (high nibble) - R1
    ChAFreqHi = 0x01,
    /// Channel B Frequency (low byte) - R2
    ChBFreqLo = 0x02,
    /// Channel B Frequency (high nibble) - R3
    ChBFreqHi = 0x03,
    /// Channel C Frequency (low byte) - R4
    ChCFreqLo = 0x04,
    /// Channel C Frequency (high nibble) - R5
    ChCFreqHi = 0x05,
    /// Noise Frequency Control - R6
    NoiseFreq = 0x06,
    /// Mixer Control (tone/noise disable bits) - R7
    MixerCtrl = 0x07,
    /// Channel A Amplitude - R8
    ChAAmplitude = 0x08,
    /// Channel B Amplitude - R9
    ChBAmplitude = 0x09,
    /// Channel C Amplitude - R10
    ChCAmplitude = 0x0A,
    /// Envelope Frequency (low byte) - R11
    EnvelopeFreqLo = 0x0B,
    /// Envelope Frequency (high byte) - R12
    EnvelopeFreqHi = 0x0C,
    /// Envelope Shape - R13
    EnvelopeShape = 0x0D,
}

impl Register {
    /// Convert a raw register number to a Register; 14 and above give `None`
    pub fn from_addr(addr: u8) -> Option<Self> {
        match addr {
            0x00 => Some(Register::ChAFreqLo),
            0x01 => Some(Register::ChAFreqHi),
            0x02 => Some(Register::ChBFreqLo),
            0x03 => Some(Register::ChBFreqHi),
            0x04 => Some(Register::ChCFreqLo),
            0x05 => Some(Register::ChCFreqHi),
            0x06 => Some(Register::NoiseFreq),
            0x07 => Some(Register::MixerCtrl),
            0x08 => Some(Register::ChAAmplitude),
            0x09 => Some(Register::ChBAmplitude),
            0x0A => Some(Register::ChCAmplitude),
            0x0B => Some(Register::EnvelopeFreqLo),
            0x0C => Some(Register::EnvelopeFreqHi),
            0x0D => Some(Register::EnvelopeShape),
            _ => None,
        }
    }

    /// Get the register address value
    pub fn addr(&self) -> u8 {
        *self as u8
    }

    /// Valid bits of this register
    pub fn mask(&self) -> u8 {
        REG_MASK[*self as usize]
    }

    /// Channel whose tone period this register holds, if any
    pub fn tone_channel(&self) -> Option<usize> {
        match self {
            Register::ChAFreqLo | Register::ChAFreqHi => Some(0),
            Register::ChBFreqLo | Register::ChBFreqHi => Some(1),
            Register::ChCFreqLo | Register::ChCFreqHi => Some(2),
            _ => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::ChAFreqLo => write!(f, "R0 (Channel A Frequency Low)"),
            Register::ChAFreqHi => write!(f, "R1 (Channel A Frequency High)"),
            Register::ChBFreqLo => write!(f, "R2 (Channel B Frequency Low)"),
            Register::ChBFreqHi => write!(f, "R3 (Channel B Frequency High)"),
            Register::ChCFreqLo => write!(f, "R4 (Channel C Frequency Low)"),
            Register::ChCFreqHi => write!(f, "R5 (Channel C Frequency High)"),
            Register::NoiseFreq => write!(f, "R6 (Noise Frequency)"),
            Register::MixerCtrl => write!(f, "R7 (Mixer Control)"),
            Register::ChAAmplitude => write!(f, "R8 (Channel A Amplitude)"),
            Register::ChBAmplitude => write!(f, "R9 (Channel B Amplitude)"),
            Register::ChCAmplitude => write!(f, "R10 (Channel C Amplitude)"),
            Register::EnvelopeFreqLo => write!(f, "R11 (Envelope Frequency Low)"),
            Register::EnvelopeFreqHi => write!(f, "R12 (Envelope Frequency High)"),
            Register::EnvelopeShape => write!(f, "R13 (Envelope Shape)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_conversion() {
        assert_eq!(Register::from_addr(0x00), Some(Register::ChAFreqLo));
        assert_eq!(Register::from_addr(0x0D), Some(Register::EnvelopeShape));
        assert_eq!(Register::from_addr(0x0E), None);
        assert_eq!(Register::from_addr(0x10), None);
    }

    #[test]
    fn test_register_masks() {
        assert_eq!(Register::NoiseFreq.mask(), 0x1F);
        assert_eq!(Register::MixerCtrl.mask(), 0x3F);
        assert_eq!(Register::ChBFreqHi.mask(), 0x0F);
        assert_eq!(Register::EnvelopeShape.mask(), 0x0F);
    }

    #[test]
    fn test_tone_channel() {
        assert_eq!(Register::ChCFreqHi.tone_channel(), Some(2));
        assert_eq!(Register::MixerCtrl.tone_channel(), None);
    }
}

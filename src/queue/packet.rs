//! Packet Definitions
//!
//! Wire layout (8 bytes, little-endian):
//!
//! | offset | field | notes |
//! |---|---|---|
//! | 0-1 | `tick` | target dispatch tick, modulo 65536 |
//! | 2 | `op` | [`Opcode`] |
//! | 3 | `reg` | register index, or channel in the low 2 bits |
//! | 4 | `val` | opcode specific |
//! | 5 | `arg` | opcode specific |
//! | 6-7 | padding | always zero |

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoded size of a packet in bytes
pub const PACKET_SIZE: usize = 8;

/// Command kind carried in [`Packet::op`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    /// Raw register write (`reg` = 0..=13, `val` = value)
    RegisterWrite = 0,
    /// Vibrato LFO (`val` = depth in cents, `arg` = rate in 0.1 Hz)
    LfoSet = 1,
    /// Channel mute (`val` != 0 mutes)
    Mute = 2,
    /// Stereo balance (`val` = 1 hard left ..= 15 hard right)
    Pan = 3,
    /// Waveform selector (`val` = [`Waveform`])
    Timbre = 4,
    /// Suppress envelope restart on new notes (`val` != 0)
    Legato = 5,
}

impl Opcode {
    /// Decode a raw opcode byte; unknown values give `None`
    pub fn from_u8(op: u8) -> Option<Self> {
        <Self as FromPrimitive>::from_u8(op)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::RegisterWrite => write!(f, "REG"),
            Opcode::LfoSet => write!(f, "LFO"),
            Opcode::Mute => write!(f, "MUTE"),
            Opcode::Pan => write!(f, "PAN"),
            Opcode::Timbre => write!(f, "TIMBRE"),
            Opcode::Legato => write!(f, "LEGATO"),
        }
    }
}

/// Oscillator waveform of a tone channel
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromPrimitive, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Waveform {
    /// Classic 50% square
    #[default]
    Square = 0,
    /// Symmetric triangle
    Triangle = 1,
    /// Rising ramp
    Sawtooth = 2,
    /// Falling ramp
    InverseSawtooth = 3,
}

impl Waveform {
    /// Decode a timbre selector; values above 3 give `None`
    pub fn from_u8(val: u8) -> Option<Self> {
        <Self as FromPrimitive>::from_u8(val)
    }
}

/// A timed command
///
/// Plain value, no pointers: safe to copy across the core boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C, align(8))]
pub struct Packet {
    /// Target dispatch tick (milliseconds, modulo 65536)
    pub tick: u16,
    /// Raw opcode byte
    pub op: u8,
    /// Register index or channel
    pub reg: u8,
    /// First operand
    pub val: u8,
    /// Second operand
    pub arg: u8,
}

impl Packet {
    /// Build a packet from raw fields
    pub const fn new(tick: u16, op: u8, reg: u8, val: u8, arg: u8) -> Self {
        Packet {
            tick,
            op,
            reg,
            val,
            arg,
        }
    }

    /// Register write
    pub const fn register_write(tick: u16, reg: u8, val: u8) -> Self {
        Self::new(tick, Opcode::RegisterWrite as u8, reg, val, 0)
    }

    /// Vibrato depth (cents) and rate (0.1 Hz units) for `channel`
    pub const fn lfo(tick: u16, channel: u8, depth: u8, rate: u8) -> Self {
        Self::new(tick, Opcode::LfoSet as u8, channel, depth, rate)
    }

    /// Mute or unmute `channel`
    pub const fn mute(tick: u16, channel: u8, muted: bool) -> Self {
        Self::new(tick, Opcode::Mute as u8, channel, muted as u8, 0)
    }

    /// Stereo balance of `channel` (1..=15, 8 is center)
    pub const fn pan(tick: u16, channel: u8, pan: u8) -> Self {
        Self::new(tick, Opcode::Pan as u8, channel, pan, 0)
    }

    /// Waveform of `channel`
    pub const fn timbre(tick: u16, channel: u8, waveform: Waveform) -> Self {
        Self::new(tick, Opcode::Timbre as u8, channel, waveform as u8, 0)
    }

    /// Legato flag of `channel`
    pub const fn legato(tick: u16, channel: u8, legato: bool) -> Self {
        Self::new(tick, Opcode::Legato as u8, channel, legato as u8, 0)
    }

    /// Decoded opcode, `None` for unknown (forward compatible) values
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.op)
    }

    /// Channel addressed by the per-channel opcodes (low 2 bits of `reg`)
    #[inline]
    pub fn channel(&self) -> usize {
        (self.reg & 0x03) as usize
    }

    /// Whether this packet may be dispatched at tick `now`
    ///
    /// Uses the signed 16-bit difference so the comparison survives the
    /// counter wrapping at 65536.
    #[inline]
    pub fn is_due(&self, now: u16) -> bool {
        (self.tick.wrapping_sub(now) as i16) <= 0
    }

    /// Encode to the 8-byte wire format
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let tick = self.tick.to_le_bytes();
        [tick[0], tick[1], self.op, self.reg, self.val, self.arg, 0, 0]
    }

    /// Decode from the 8-byte wire format (padding is ignored)
    pub fn from_bytes(bytes: [u8; PACKET_SIZE]) -> Self {
        Packet {
            tick: u16::from_le_bytes([bytes[0], bytes[1]]),
            op: bytes[2],
            reg: bytes[3],
            val: bytes[4],
            arg: bytes[5],
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode() {
            Some(op) => write!(
                f,
                "@{:05} {:<6} reg={:02} val=0x{:02X} arg=0x{:02X}",
                self.tick, op, self.reg, self.val, self.arg
            ),
            None => write!(
                f,
                "@{:05} op?{:<3} reg={:02} val=0x{:02X} arg=0x{:02X}",
                self.tick, self.op, self.reg, self.val, self.arg
            ),
        }
    }
}

//! Command scripts
//!
//! A script is a JSON list of commands stamped with absolute times in
//! milliseconds, or the equivalent binary packet stream:
//!
//! ```json
//! {
//!   "config": { "sample_rate": 22050 },
//!   "events": [
//!     { "at": 0,   "cmd": "reg", "reg": 7, "val": 62 },
//!     { "at": 0,   "cmd": "reg", "reg": 0, "val": 142 },
//!     { "at": 0,   "cmd": "reg", "reg": 8, "val": 15 },
//!     { "at": 250, "cmd": "lfo", "channel": 0, "depth": 30, "rate": 55 },
//!     { "at": 900, "cmd": "reg", "reg": 8, "val": 0 }
//!   ]
//! }
//! ```
//!
//! [`Sequencer`] feeds a script into a running engine a little ahead of
//! time, so scripts far longer than the queue play without drops.

use super::{EngineConfig, Psg, MAX_DELAY_TICKS};
use crate::queue::{decode_stream, Opcode, Packet, Waveform};
use crate::{PsgError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One command, without its time stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Classic register write
    Reg {
        /// Register index (0-13)
        reg: u8,
        /// Value
        val: u8,
    },
    /// Vibrato
    Lfo {
        /// Channel (0-2)
        channel: u8,
        /// Depth in cents (0-127)
        depth: u8,
        /// Rate in 0.1 Hz
        rate: u8,
    },
    /// Mute on/off
    Mute {
        /// Channel (0-2)
        channel: u8,
        /// Muted
        on: bool,
    },
    /// Stereo balance
    Pan {
        /// Channel (0-2)
        channel: u8,
        /// 1 = hard left, 8 = center, 15 = hard right
        pan: u8,
    },
    /// Waveform
    Timbre {
        /// Channel (0-2)
        channel: u8,
        /// Waveform name
        waveform: Waveform,
    },
    /// Legato on/off
    Legato {
        /// Channel (0-2)
        channel: u8,
        /// Suppress envelope restarts
        on: bool,
    },
}

impl Command {
    /// Packet for this command at `tick`
    pub fn to_packet(&self, tick: u16) -> Packet {
        match *self {
            Command::Reg { reg, val } => Packet::register_write(tick, reg, val),
            Command::Lfo {
                channel,
                depth,
                rate,
            } => Packet::lfo(tick, channel, depth, rate),
            Command::Mute { channel, on } => Packet::mute(tick, channel, on),
            Command::Pan { channel, pan } => Packet::pan(tick, channel, pan),
            Command::Timbre { channel, waveform } => Packet::timbre(tick, channel, waveform),
            Command::Legato { channel, on } => Packet::legato(tick, channel, on),
        }
    }

    /// Command carried by `packet`; unknown opcodes and timbres give `None`
    pub fn from_packet(packet: &Packet) -> Option<Self> {
        let channel = packet.reg & 0x03;
        let command = match packet.opcode()? {
            Opcode::RegisterWrite => Command::Reg {
                reg: packet.reg,
                val: packet.val,
            },
            Opcode::LfoSet => Command::Lfo {
                channel,
                depth: packet.val,
                rate: packet.arg,
            },
            Opcode::Mute => Command::Mute {
                channel,
                on: packet.val != 0,
            },
            Opcode::Pan => Command::Pan {
                channel,
                pan: packet.val,
            },
            Opcode::Timbre => Command::Timbre {
                channel,
                waveform: Waveform::from_u8(packet.val)?,
            },
            Opcode::Legato => Command::Legato {
                channel,
                on: packet.val != 0,
            },
        };
        Some(command)
    }
}

/// A command at an absolute time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEvent {
    /// Milliseconds from the start of the script
    pub at: u32,
    /// What to do
    #[serde(flatten)]
    pub command: Command,
}

/// Timed command list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Engine settings the script was written for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EngineConfig>,
    /// Events, kept sorted by time
    pub events: Vec<ScriptEvent>,
}

impl Script {
    /// Build from events (sorted stably by time)
    pub fn new(mut events: Vec<ScriptEvent>) -> Self {
        events.sort_by_key(|event| event.at);
        Script {
            config: None,
            events,
        }
    }

    /// Parse a JSON script
    pub fn from_json_str(json: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(json)?;
        if let Some(config) = &script.config {
            config.validate()?;
        }
        let config = script.config;
        Ok(Script {
            config,
            ..Script::new(script.events)
        })
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build from a packet stream whose ticks count from 0
    pub fn from_packets(packets: &[Packet]) -> Self {
        let events = packets
            .iter()
            .filter_map(|packet| {
                Command::from_packet(packet).map(|command| ScriptEvent {
                    at: packet.tick as u32,
                    command,
                })
            })
            .collect();
        Script::new(events)
    }

    /// Packets with ticks counted from 0
    pub fn to_packets(&self) -> Result<Vec<Packet>> {
        self.events
            .iter()
            .map(|event| {
                let tick = u16::try_from(event.at).map_err(|_| {
                    PsgError::Wire(format!(
                        "event at {} ms does not fit a 16-bit tick",
                        event.at
                    ))
                })?;
                Ok(event.command.to_packet(tick))
            })
            .collect()
    }

    /// Load a `.json` script or a binary packet stream
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&std::fs::read_to_string(path)?)
        } else {
            Ok(Self::from_packets(&decode_stream(&std::fs::read(path)?)?))
        }
    }

    /// Time of the last event
    pub fn duration_ms(&self) -> u32 {
        self.events.last().map_or(0, |event| event.at)
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether there are no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Feeds a script into a running engine
#[derive(Debug, Clone)]
pub struct Sequencer {
    events: Vec<ScriptEvent>,
    next: usize,
    origin: u16,
    last_now: u16,
    elapsed: u32,
    lookahead: u16,
}

impl Sequencer {
    /// Default look-ahead window
    pub const DEFAULT_LOOKAHEAD_MS: u16 = 50;

    /// Start playing `script` at tick `now`
    pub fn new(script: &Script, now: u16) -> Self {
        Sequencer {
            events: script.events.clone(),
            next: 0,
            origin: now,
            last_now: now,
            elapsed: 0,
            lookahead: Self::DEFAULT_LOOKAHEAD_MS,
        }
    }

    /// Change the look-ahead window
    pub fn with_lookahead(mut self, ms: u16) -> Self {
        self.lookahead = ms.min(MAX_DELAY_TICKS);
        self
    }

    /// Push every event inside the look-ahead window; returns how many
    ///
    /// Stops early when the queue is full and resumes on the next call.
    pub fn pump(&mut self, psg: &mut Psg) -> usize {
        let now = psg.now();
        self.elapsed += now.wrapping_sub(self.last_now) as u32;
        self.last_now = now;

        let horizon = self.elapsed + self.lookahead as u32;
        let mut pushed = 0;
        while let Some(event) = self.events.get(self.next) {
            if event.at > horizon || psg.free() == 0 {
                break;
            }
            let tick = self.origin.wrapping_add(event.at as u16);
            psg.push_at(tick, event.command.to_packet(tick));
            self.next += 1;
            pushed += 1;
        }
        pushed
    }

    /// Milliseconds since the sequencer started
    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed
    }

    /// Whether every event has been queued
    pub fn is_finished(&self) -> bool {
        self.next >= self.events.len()
    }
}

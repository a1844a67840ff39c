//! Voice State
//!
//! [`Voices`] is the complete synthesis state: the 14 classic registers,
//! three voices with their extension fields, the shared noise generator and
//! the shared envelope shape/period. It is a plain fixed-size value, mutated
//! by [`Voices::apply`] and read by [`Voices::render_one`], both expected to
//! run under the engine's critical section.

use crate::psg::envelope::{EnvelopeGen, EnvelopeShape};
use crate::psg::generators::{envelope_increment, NoiseGenerator, ToneGenerator, Vibrato};
use crate::psg::mixer::{MixerFlags, StereoMix};
use crate::psg::registers::{Register, REGISTER_COUNT};
use crate::psg::tables::{volume, CHANNEL_MAX, PAN_CENTER};
use crate::queue::{Opcode, Packet, Waveform};

/// Number of tone channels
pub const NUM_CHANNELS: usize = 3;

/// Default chip master clock (Hz)
pub const DEFAULT_CHIP_CLOCK: u32 = 2_000_000;

/// Default output sample rate (Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Amplitude register bit selecting the envelope level
const VOLUME_USE_ENVELOPE: u8 = 0x10;

/// Per-channel state of one voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    tone: ToneGenerator,
    vibrato: Vibrato,
    envelope: EnvelopeGen,
    waveform: Waveform,
    volume: u8,
    pan: u8,
    muted: bool,
    legato: bool,
}

impl Voice {
    const fn new() -> Self {
        Voice {
            tone: ToneGenerator::new(),
            vibrato: Vibrato::new(),
            envelope: EnvelopeGen::new(),
            waveform: Waveform::Square,
            volume: 0,
            pan: PAN_CENTER,
            muted: false,
            legato: false,
        }
    }

    /// Current tone phase accumulator
    pub fn phase(&self) -> u32 {
        self.tone.phase()
    }

    /// Phase increment from the period registers (before vibrato)
    pub fn increment(&self) -> u32 {
        self.tone.increment()
    }

    /// Selected waveform
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Amplitude register value (level in bits 0-3, envelope select in bit 4)
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Whether the level comes from the envelope
    pub fn uses_envelope(&self) -> bool {
        self.volume & VOLUME_USE_ENVELOPE != 0
    }

    /// Stereo balance (1 = hard left, 15 = hard right)
    pub fn pan(&self) -> u8 {
        self.pan
    }

    /// Whether the channel is muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Whether tone writes skip the envelope restart
    pub fn is_legato(&self) -> bool {
        self.legato
    }

    /// This channel's envelope generator
    pub fn envelope(&self) -> &EnvelopeGen {
        &self.envelope
    }

    /// This channel's vibrato LFO
    pub fn vibrato(&self) -> &Vibrato {
        &self.vibrato
    }

    /// Effective 4-bit level
    #[inline]
    fn level(&self) -> u8 {
        if self.uses_envelope() {
            self.envelope.level()
        } else {
            self.volume & 0x0F
        }
    }
}

/// The chip: registers plus all running generator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voices {
    chip_clock: u32,
    sample_rate: u32,
    regs: [u8; REGISTER_COUNT],
    voices: [Voice; NUM_CHANNELS],
    noise: NoiseGenerator,
    mixer: MixerFlags,
    env_shape: EnvelopeShape,
    /// Envelope periods per sample (32.32)
    env_increment: u64,
}

impl Voices {
    /// Create a chip in its power-on state
    ///
    /// All registers are zero except the mixer (R7 = 0x3F, everything
    /// disabled); pans are centered.
    pub fn new(chip_clock: u32, sample_rate: u32) -> Self {
        let mut chip = Voices {
            chip_clock,
            sample_rate,
            regs: [0; REGISTER_COUNT],
            voices: [Voice::new(); NUM_CHANNELS],
            noise: NoiseGenerator::new(),
            mixer: MixerFlags::default(),
            env_shape: EnvelopeShape::empty(),
            env_increment: 0,
        };
        chip.reset();
        chip
    }

    /// Return to the power-on state, keeping clock and sample rate
    pub fn reset(&mut self) {
        self.regs = [0; REGISTER_COUNT];
        self.voices = [Voice::new(); NUM_CHANNELS];
        self.noise = NoiseGenerator::new();
        self.noise.set_period(0, self.chip_clock, self.sample_rate);
        self.env_shape = EnvelopeShape::empty();
        self.env_increment = envelope_increment(0, self.chip_clock, self.sample_rate);
        self.write_register(Register::MixerCtrl.addr(), 0x3F);
    }

    /// Chip master clock (Hz)
    pub fn chip_clock(&self) -> u32 {
        self.chip_clock
    }

    /// Output sample rate (Hz)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Apply one command
    ///
    /// Unknown opcodes and malformed operands leave the state untouched.
    pub fn apply(&mut self, packet: &Packet) {
        let Some(op) = packet.opcode() else {
            return;
        };
        if op == Opcode::RegisterWrite {
            self.write_register(packet.reg, packet.val);
            return;
        }

        let ch = packet.channel();
        if ch >= NUM_CHANNELS {
            return;
        }
        let voice = &mut self.voices[ch];
        match op {
            Opcode::LfoSet => {
                if packet.val <= Vibrato::MAX_DEPTH {
                    voice.vibrato.set(packet.val, packet.arg);
                }
            }
            Opcode::Mute => voice.muted = packet.val != 0,
            Opcode::Pan => {
                if (1..=15).contains(&packet.val) {
                    voice.pan = packet.val;
                }
            }
            Opcode::Timbre => {
                if let Some(wave) = Waveform::from_u8(packet.val) {
                    voice.waveform = wave;
                }
            }
            Opcode::Legato => voice.legato = packet.val != 0,
            Opcode::RegisterWrite => {}
        }
    }

    /// Write a classic register (values are masked to the register width)
    pub fn write_register(&mut self, addr: u8, value: u8) {
        let Some(reg) = Register::from_addr(addr) else {
            return;
        };
        let value = value & reg.mask();
        self.regs[addr as usize] = value;

        if let Some(ch) = reg.tone_channel() {
            let period = self.tone_period(ch);
            let voice = &mut self.voices[ch];
            voice.tone.set_period(period, self.chip_clock, self.sample_rate);
            // a new note retriggers the envelope unless legato
            if addr % 2 == 0 && voice.uses_envelope() && !voice.legato {
                voice.envelope.restart(self.env_shape);
            }
            return;
        }

        match reg {
            Register::ChAFreqLo
            | Register::ChAFreqHi
            | Register::ChBFreqLo
            | Register::ChBFreqHi
            | Register::ChCFreqLo
            | Register::ChCFreqHi => {} // tone periods handled above
            Register::NoiseFreq => {
                self.noise
                    .set_period(value, self.chip_clock, self.sample_rate);
            }
            Register::MixerCtrl => self.mixer = MixerFlags::from_register(value),
            Register::ChAAmplitude | Register::ChBAmplitude | Register::ChCAmplitude => {
                self.voices[(addr - 8) as usize].volume = value;
            }
            Register::EnvelopeFreqLo | Register::EnvelopeFreqHi => {
                self.env_increment =
                    envelope_increment(self.envelope_period(), self.chip_clock, self.sample_rate);
            }
            Register::EnvelopeShape => {
                self.env_shape = EnvelopeShape::from_register(value);
                for voice in &mut self.voices {
                    voice.envelope.restart(self.env_shape);
                }
            }
        }
    }

    /// Snapshot of the 14 registers
    pub fn registers(&self) -> [u8; REGISTER_COUNT] {
        self.regs
    }

    /// 12-bit tone period of `channel`
    pub fn tone_period(&self, channel: usize) -> u16 {
        let lo = self.regs[channel * 2] as u16;
        let hi = self.regs[channel * 2 + 1] as u16;
        (hi << 8) | lo
    }

    /// 5-bit noise period
    pub fn noise_period(&self) -> u8 {
        self.regs[Register::NoiseFreq as usize]
    }

    /// Mixer control flags
    pub fn mixer(&self) -> MixerFlags {
        self.mixer
    }

    /// 16-bit envelope period
    pub fn envelope_period(&self) -> u16 {
        let lo = self.regs[Register::EnvelopeFreqLo as usize] as u16;
        let hi = self.regs[Register::EnvelopeFreqHi as usize] as u16;
        (hi << 8) | lo
    }

    /// Shared envelope shape
    pub fn envelope_shape(&self) -> EnvelopeShape {
        self.env_shape
    }

    /// Inspect one voice (`channel` < [`NUM_CHANNELS`])
    pub fn voice(&self, channel: usize) -> &Voice {
        &self.voices[channel]
    }

    /// Advance every vibrato LFO by one millisecond
    pub fn tick_lfo(&mut self) {
        for voice in &mut self.voices {
            voice.vibrato.tick();
        }
    }

    /// Render one stereo sample pair (12-bit unsigned)
    pub fn render_one(&mut self) -> (u16, u16) {
        let noise = self.noise.tick();
        let mut mix = StereoMix::new();

        for (ch, voice) in self.voices.iter_mut().enumerate() {
            voice.envelope.clock(self.env_shape, self.env_increment);
            let increment = voice.vibrato.modulate(voice.tone.increment());
            let wave = voice.tone.tick(voice.waveform, increment);
            if voice.muted {
                continue;
            }
            let gated = self.mixer.gate(ch, wave, noise);
            let amplitude = gated * volume(voice.level()) / CHANNEL_MAX;
            mix.add(amplitude, voice.pan);
        }

        mix.finish()
    }
}

impl Default for Voices {
    fn default() -> Self {
        Self::new(DEFAULT_CHIP_CLOCK, DEFAULT_SAMPLE_RATE)
    }
}

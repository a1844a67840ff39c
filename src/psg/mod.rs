//! Voice/Register State Domain
//!
//! The "chip": all synthesis parameters and per-channel running state, a
//! fixed-size value with no heap allocation so it can live in a static.
//!
//! Implementation:
//! - `registers` - classic 14-register map and field widths
//! - `tables` - volume curve, pan law, soft clip
//! - `envelope` - shared-shape envelope state machine
//! - `generators` - tone oscillator, vibrato LFO, noise LFSR
//! - `mixer` - R7 mixer flags and the stereo summing stage
//! - `chip` - [`Voices`]: command application and sample rendering

pub mod chip;
pub mod envelope;
pub mod generators;
pub mod mixer;
pub mod registers;
pub mod tables;

pub use chip::{Voices, DEFAULT_CHIP_CLOCK, DEFAULT_SAMPLE_RATE, NUM_CHANNELS};
pub use envelope::{EnvelopeGen, EnvelopeShape};
pub use mixer::MixerFlags;
pub use registers::{Register, REGISTER_COUNT, REG_MASK};
pub use tables::{soft_clip, SAMPLE_MAX};

//! Software Programmable Sound Generator
//!
//! A register-compatible emulation of the classic 3-channel tone/noise sound
//! chip (AY-3-8910 / YM2149 register layout), built to run split across two
//! execution contexts: a producer that issues timed commands and a real-time
//! context that dispatches them at 1 kHz and renders a stereo 12-bit PCM stream
//! at the audio sample rate.
//!
//! # Features
//! - Lock-free SPSC packet queue crossing the context boundary
//! - Classic 14-register model plus vibrato, pan, timbre and legato extensions
//! - Shared envelope generator with the classical shape bit semantics
//! - Critical sections backed by a hardware spinlock model or IRQ masking
//! - Pluggable output drivers (PWM, SPI DAC, PIO+DMA DAC, WAV, host audio)
//!
//! # Crate feature flags
//! - `export-wav` (default): WAV file output driver (`hound`)
//! - `streaming` (opt-in): host audio output driver (`rodio`)
//! - `cli` (default): the `pico-psg` command line front end
//!
//! # Quick start
//! ## Offline rendering
//! ```no_run
//! use pico_psg::driver::{WavConfig, WavDriver};
//! use pico_psg::engine::{Engine, EngineConfig};
//!
//! let config = EngineConfig::default();
//! let wav = WavConfig::new("a440.wav");
//! let (mut psg, mut core) = Engine::offline::<WavDriver>(config, wav).unwrap();
//! psg.enqueue(0, 0x07, 0x3E); // tone A only
//! psg.enqueue(0, 0x00, 142); // A4 period low
//! psg.enqueue(0, 0x08, 0x0F); // volume A
//! core.run_ms(1000);
//! core.shutdown();
//! ```
//!
//! ## Real-time context
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use pico_psg::driver::{StreamConfig, StreamDriver};
//! use pico_psg::engine::{launch, EngineConfig};
//!
//! let config = EngineConfig::default();
//! let mut psg = launch::<StreamDriver>(config, StreamConfig::default()).unwrap();
//! psg.enqueue(0, 0x08, 0x0F);
//! psg.enqueue(500, 0x08, 0x00);
//! # }
//! ```

#![warn(missing_docs)]

pub mod driver; // Output drivers
pub mod engine; // Dispatcher, renderer and lifecycle
pub mod psg; // Voice/register state
pub mod queue; // Packets and the SPSC ring
pub mod sync; // Critical sections

/// Error types for PSG engine operations
///
/// Only startup and non-real-time paths produce errors. The dispatch and
/// render paths treat invalid input as "ignore".
#[derive(thiserror::Error, Debug)]
pub enum PsgError {
    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output driver could not be initialized
    #[error("Driver initialization failed: {0}")]
    DriverInit(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed packet stream or script
    #[error("Wire format error: {0}")]
    Wire(String),

    /// Real-time context could not be started
    #[error("Launch error: {0}")]
    Launch(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for PsgError {
    /// Converts a String into `PsgError::Other`.
    ///
    /// Prefer the specific variants (`Config`, `DriverInit`, ...) where the
    /// failure kind is known.
    fn from(msg: String) -> Self {
        PsgError::Other(msg)
    }
}

impl From<&str> for PsgError {
    /// Converts a string slice into `PsgError::Other`.
    fn from(msg: &str) -> Self {
        PsgError::Other(msg.to_string())
    }
}

impl From<serde_json::Error> for PsgError {
    fn from(err: serde_json::Error) -> Self {
        PsgError::Config(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, PsgError>;

// Public API exports
pub use driver::OutputDriver;
pub use engine::{launch, Engine, EngineConfig, Psg};
pub use psg::Voices;
pub use queue::{Opcode, Packet};
pub use sync::CriticalSection;

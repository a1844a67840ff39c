//! Output Drivers
//!
//! An output driver consumes finished 12-bit stereo sample pairs. It is
//! chosen once, before the real-time context starts, and called through
//! static dispatch from the render tick:
//!
//! - [`PwmDriver`] - two PWM channels, duty cycle per sample
//! - [`SpiDacDriver`] - dual SPI DAC, one blocking transfer per channel
//! - [`PioDacDriver`] - dual DAC fed by double-buffered PIO+DMA blocks
//! - [`WavDriver`] - WAV file (feature `export-wav`)
//! - [`StreamDriver`] - host audio device (feature `streaming`)
//! - [`NullDriver`], [`MemoryDriver`] - discard / capture, for tests
//!
//! `init` is the only fallible operation. `write` must never block for
//! longer than one sample period and never fails; transfer errors are
//! counted by the driver.

pub mod pio;
pub mod pwm;
pub mod spi_dac;
#[cfg(feature = "streaming")]
pub mod stream;
#[cfg(feature = "export-wav")]
pub mod wav;

pub use pio::{PioDacConfig, PioDacDriver, PioDmaChannel, PIO_BLOCK_FRAMES};
pub use pwm::{PwmConfig, PwmDriver};
pub use spi_dac::{DacCommand, SpiDacConfig, SpiDacDriver};
#[cfg(feature = "streaming")]
pub use stream::{StreamConfig, StreamDriver};
#[cfg(feature = "export-wav")]
pub use wav::{WavConfig, WavDriver};

use crate::Result;

/// Sink for rendered sample pairs
pub trait OutputDriver: Sized {
    /// Hardware resources and options handed to [`OutputDriver::init`]
    type Config: Send + 'static;

    /// Claim and configure the hardware
    fn init(config: Self::Config, sample_rate: u32) -> Result<Self>;

    /// Begin output
    fn start(&mut self);

    /// End output and park the hardware at a safe level
    fn stop(&mut self);

    /// Emit one stereo sample pair (12-bit unsigned each)
    fn write(&mut self, left: u16, right: u16);
}

/// Discards every sample
#[derive(Debug, Default)]
pub struct NullDriver {
    written: u64,
    running: bool,
}

impl NullDriver {
    /// Sample pairs received while running
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl OutputDriver for NullDriver {
    type Config = ();

    fn init(_config: (), _sample_rate: u32) -> Result<Self> {
        Ok(NullDriver::default())
    }

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn write(&mut self, _left: u16, _right: u16) {
        if self.running {
            self.written += 1;
        }
    }
}

/// Records sample pairs into a preallocated buffer
///
/// The configuration is the capacity in frames; frames beyond it are
/// counted but not kept, so `write` never allocates.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    frames: Vec<(u16, u16)>,
    overflow: u64,
    running: bool,
}

impl MemoryDriver {
    /// Captured frames
    pub fn frames(&self) -> &[(u16, u16)] {
        &self.frames
    }

    /// Left channel of the captured frames
    pub fn left(&self) -> Vec<u16> {
        self.frames.iter().map(|&(left, _)| left).collect()
    }

    /// Frames that did not fit
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Take the captured frames
    pub fn into_frames(self) -> Vec<(u16, u16)> {
        self.frames
    }
}

impl OutputDriver for MemoryDriver {
    type Config = usize;

    fn init(capacity: usize, _sample_rate: u32) -> Result<Self> {
        Ok(MemoryDriver {
            frames: Vec::with_capacity(capacity),
            overflow: 0,
            running: false,
        })
    }

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn write(&mut self, left: u16, right: u16) {
        if !self.running {
            return;
        }
        if self.frames.len() < self.frames.capacity() {
            self.frames.push((left, right));
        } else {
            self.overflow += 1;
        }
    }
}

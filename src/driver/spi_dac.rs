//! SPI dual DAC output
//!
//! MCP4922-style 12-bit dual DAC. Each channel update is one 16-bit
//! big-endian word in its own chip-select frame:
//!
//! | bit | meaning |
//! |---|---|
//! | 15 | channel (0 = A/left, 1 = B/right) |
//! | 14 | buffered reference |
//! | 13 | gain (1 = 1x, 0 = 2x) |
//! | 12 | active (0 = shut down) |
//! | 11-0 | data |

use super::OutputDriver;
use crate::psg::SAMPLE_MAX;
use crate::{PsgError, Result};
use bitflags::bitflags;
use embedded_hal::spi::SpiDevice;

bitflags! {
    /// Command bits of a DAC word
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DacCommand: u16 {
        /// Select channel B
        const CHANNEL_B = 0x8000;
        /// Buffered reference input
        const BUFFERED = 0x4000;
        /// 1x output gain
        const UNITY_GAIN = 0x2000;
        /// Output enabled
        const ACTIVE = 0x1000;
    }
}

impl DacCommand {
    /// Command bits for an update of channel A (`false`) or B (`true`)
    pub fn update(channel_b: bool, buffered: bool) -> Self {
        let mut cmd = DacCommand::UNITY_GAIN | DacCommand::ACTIVE;
        cmd.set(DacCommand::CHANNEL_B, channel_b);
        cmd.set(DacCommand::BUFFERED, buffered);
        cmd
    }

    /// Full word carrying `sample`
    #[inline]
    pub fn word(self, sample: u16) -> u16 {
        self.bits() | sample.min(SAMPLE_MAX)
    }
}

/// SPI device and DAC options
#[derive(Debug)]
pub struct SpiDacConfig<S> {
    /// SPI device with the DAC's chip select
    pub spi: S,
    /// Use the buffered reference input
    pub buffered: bool,
}

impl<S> SpiDacConfig<S> {
    /// Unbuffered reference, 1x gain
    pub fn new(spi: S) -> Self {
        SpiDacConfig {
            spi,
            buffered: false,
        }
    }
}

/// Stereo output through an SPI dual DAC
#[derive(Debug)]
pub struct SpiDacDriver<S: SpiDevice> {
    spi: S,
    cmd_left: DacCommand,
    cmd_right: DacCommand,
    running: bool,
    faults: u32,
}

impl<S: SpiDevice> SpiDacDriver<S> {
    /// Failed transfers
    pub fn faults(&self) -> u32 {
        self.faults
    }

    /// SPI device
    pub fn spi(&self) -> &S {
        &self.spi
    }

    fn send(&mut self, word: u16) -> bool {
        let ok = self.spi.write(&word.to_be_bytes()).is_ok();
        if !ok {
            self.faults = self.faults.saturating_add(1);
        }
        ok
    }

    fn shutdown(&mut self) -> bool {
        let left = self.cmd_left.difference(DacCommand::ACTIVE).bits();
        let right = self.cmd_right.difference(DacCommand::ACTIVE).bits();
        self.send(left) & self.send(right)
    }
}

impl<S: SpiDevice + Send + 'static> OutputDriver for SpiDacDriver<S> {
    type Config = SpiDacConfig<S>;

    fn init(config: SpiDacConfig<S>, _sample_rate: u32) -> Result<Self> {
        let mut driver = SpiDacDriver {
            spi: config.spi,
            cmd_left: DacCommand::update(false, config.buffered),
            cmd_right: DacCommand::update(true, config.buffered),
            running: false,
            faults: 0,
        };
        // park both outputs; also proves the bus is there
        if !driver.shutdown() {
            return Err(PsgError::DriverInit("SPI DAC did not accept a transfer".into()));
        }
        Ok(driver)
    }

    fn start(&mut self) {
        self.running = true;
        self.write(0, 0);
    }

    fn stop(&mut self) {
        self.running = false;
        self.shutdown();
    }

    #[inline]
    fn write(&mut self, left: u16, right: u16) {
        if !self.running {
            return;
        }
        self.send(self.cmd_left.word(left));
        self.send(self.cmd_right.word(right));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_words() {
        let a = DacCommand::update(false, false);
        let b = DacCommand::update(true, false);
        assert_eq!(a.word(0x0ABC), 0x3ABC);
        assert_eq!(b.word(0x0ABC), 0xBABC);
        assert_eq!(DacCommand::update(false, true).word(0), 0x7000);
        assert_eq!(a.word(0xFFFF), 0x3FFF);
    }
}

//! PIO + DMA dual DAC output
//!
//! The render tick fills the back half of a double buffer. A full block
//! waits as pending until the DMA channel has drained the front half; the
//! DMA completion interrupt ([`PioDacDriver::on_transfer_complete`]) then
//! hands it over and the halves swap. A PIO state machine shifts each
//! 32-bit word out as the two DAC frames (left in the high half). Output
//! latency is one to two blocks; interrupt load drops to one per block.

use super::spi_dac::DacCommand;
use super::OutputDriver;
use crate::{PsgError, Result};
use std::fmt::Debug;

/// Frames per DMA block
pub const PIO_BLOCK_FRAMES: usize = 64;

/// A PIO state machine with a DMA channel feeding its TX FIFO
pub trait PioDmaChannel {
    /// Hardware error
    type Error: Debug;

    /// Load the program and set the shift clock for `sample_rate` frames/s
    fn configure(&mut self, sample_rate: u32) -> core::result::Result<(), Self::Error>;

    /// Begin streaming `words`; the slice stays untouched until done
    fn start(&mut self, words: &[u32]) -> core::result::Result<(), Self::Error>;

    /// Whether the previous transfer is still running
    fn is_busy(&self) -> bool;

    /// Cancel any transfer in flight
    fn abort(&mut self);
}

/// DMA channel and DAC options
#[derive(Debug)]
pub struct PioDacConfig<C> {
    /// Configured PIO/DMA pair
    pub channel: C,
    /// Use the buffered reference input
    pub buffered: bool,
}

impl<C> PioDacConfig<C> {
    /// Unbuffered reference, 1x gain
    pub fn new(channel: C) -> Self {
        PioDacConfig {
            channel,
            buffered: false,
        }
    }
}

/// Double-buffered DMA output
#[derive(Debug)]
pub struct PioDacDriver<C: PioDmaChannel> {
    channel: C,
    blocks: [[u32; PIO_BLOCK_FRAMES]; 2],
    /// Block being filled
    back: usize,
    fill: usize,
    /// Back block is full and waiting for the channel
    pending: bool,
    cmd_left: DacCommand,
    cmd_right: DacCommand,
    running: bool,
    overruns: u32,
    faults: u32,
}

impl<C: PioDmaChannel> PioDacDriver<C> {
    /// Frames dropped because both halves were waiting on DMA
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Transfers the channel refused
    pub fn faults(&self) -> u32 {
        self.faults
    }

    /// Underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    #[inline]
    fn frame(&self, left: u16, right: u16) -> u32 {
        ((self.cmd_left.word(left) as u32) << 16) | self.cmd_right.word(right) as u32
    }

    /// Whether a full block is waiting for the channel
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// DMA completion interrupt: hand the pending block to the channel
    pub fn on_transfer_complete(&mut self) {
        self.submit();
    }

    fn submit(&mut self) {
        if !self.pending || self.channel.is_busy() {
            return;
        }
        if self.channel.start(&self.blocks[self.back]).is_ok() {
            self.back ^= 1;
        } else {
            // the block is lost; refill the same half
            self.faults = self.faults.saturating_add(1);
        }
        self.pending = false;
    }
}

impl<C: PioDmaChannel + Send + 'static> OutputDriver for PioDacDriver<C> {
    type Config = PioDacConfig<C>;

    fn init(mut config: PioDacConfig<C>, sample_rate: u32) -> Result<Self> {
        config
            .channel
            .configure(sample_rate)
            .map_err(|err| PsgError::DriverInit(format!("PIO/DMA setup failed: {err:?}")))?;
        Ok(PioDacDriver {
            channel: config.channel,
            blocks: [[0; PIO_BLOCK_FRAMES]; 2],
            back: 0,
            fill: 0,
            pending: false,
            cmd_left: DacCommand::update(false, config.buffered),
            cmd_right: DacCommand::update(true, config.buffered),
            running: false,
            overruns: 0,
            faults: 0,
        })
    }

    fn start(&mut self) {
        self.back = 0;
        self.fill = 0;
        self.pending = false;
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        self.pending = false;
        self.channel.abort();
        let idle = self.frame(0, 0);
        self.blocks[self.back] = [idle; PIO_BLOCK_FRAMES];
        if self.channel.start(&self.blocks[self.back][..1]).is_err() {
            self.faults = self.faults.saturating_add(1);
        }
    }

    #[inline]
    fn write(&mut self, left: u16, right: u16) {
        if !self.running {
            return;
        }
        if self.pending {
            // completion may have been missed; poll once before dropping
            self.submit();
            if self.pending {
                self.overruns = self.overruns.saturating_add(1);
                return;
            }
        }
        self.blocks[self.back][self.fill] = self.frame(left, right);
        self.fill += 1;
        if self.fill == PIO_BLOCK_FRAMES {
            self.fill = 0;
            self.pending = true;
            self.submit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeDma {
        sent: Vec<Vec<u32>>,
        busy: bool,
        broken: bool,
    }

    impl PioDmaChannel for FakeDma {
        type Error = ();

        fn configure(&mut self, sample_rate: u32) -> core::result::Result<(), ()> {
            if sample_rate > 0 {
                Ok(())
            } else {
                Err(())
            }
        }

        fn start(&mut self, words: &[u32]) -> core::result::Result<(), ()> {
            if self.broken {
                return Err(());
            }
            self.sent.push(words.to_vec());
            Ok(())
        }

        fn is_busy(&self) -> bool {
            self.busy
        }

        fn abort(&mut self) {
            self.busy = false;
        }
    }

    #[test]
    fn test_blocks_alternate_and_pack_frames() {
        let mut driver = PioDacDriver::init(PioDacConfig::new(FakeDma::default()), 22_050).unwrap();
        driver.start();
        for n in 0..(2 * PIO_BLOCK_FRAMES) as u16 {
            driver.write(n, 4095 - n);
        }
        let sent = &driver.channel().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0][0], 0x3000_BFFF);
        assert_eq!(sent[1][0], ((0x3000 | 64) << 16) | (0xB000 | (4095 - 64)));
    }

    fn left_of(word: u32) -> u16 {
        (word >> 16) as u16 & 0x0FFF
    }

    #[test]
    fn test_block_filled_while_busy_is_kept_for_completion() {
        let mut driver = PioDacDriver::init(PioDacConfig::new(FakeDma::default()), 22_050).unwrap();
        driver.start();
        driver.channel.busy = true;
        for n in 0..PIO_BLOCK_FRAMES as u16 {
            driver.write(100 + n, 0);
        }
        assert!(driver.is_pending());
        assert!(driver.channel().sent.is_empty());

        // DMA drains and raises its completion interrupt
        driver.channel.busy = false;
        driver.on_transfer_complete();
        assert!(!driver.is_pending());
        for n in 0..PIO_BLOCK_FRAMES as u16 {
            driver.write(1000 + n, 0);
        }

        let sent = &driver.channel().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(left_of(sent[0][0]), 100);
        assert_eq!(left_of(sent[0][63]), 163);
        assert_eq!(left_of(sent[1][0]), 1000);
        assert_eq!(driver.overruns(), 0);
    }

    #[test]
    fn test_pending_block_sent_on_next_write_without_interrupt() {
        let mut driver = PioDacDriver::init(PioDacConfig::new(FakeDma::default()), 22_050).unwrap();
        driver.start();
        driver.channel.busy = true;
        for n in 0..PIO_BLOCK_FRAMES as u16 {
            driver.write(100 + n, 0);
        }
        driver.channel.busy = false;
        driver.write(1000, 0);

        let sent = &driver.channel().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(left_of(sent[0][0]), 100);
        assert!(!driver.is_pending());
    }

    #[test]
    fn test_busy_dma_drops_frames_only_when_both_halves_full() {
        let mut driver = PioDacDriver::init(PioDacConfig::new(FakeDma::default()), 22_050).unwrap();
        driver.start();
        driver.channel.busy = true;
        for _ in 0..PIO_BLOCK_FRAMES + 3 {
            driver.write(1, 1);
        }
        assert_eq!(driver.overruns(), 3);
        assert!(driver.channel().sent.is_empty());

        driver.channel.busy = false;
        driver.on_transfer_complete();
        assert_eq!(driver.channel().sent.len(), 1);
    }

    #[test]
    fn test_refused_transfer_counted_as_fault() {
        let mut driver = PioDacDriver::init(PioDacConfig::new(FakeDma::default()), 22_050).unwrap();
        driver.start();
        driver.channel.broken = true;
        for _ in 0..2 * PIO_BLOCK_FRAMES {
            driver.write(1, 1);
        }
        assert_eq!(driver.faults(), 2);
        assert_eq!(driver.overruns(), 0);
        assert!(!driver.is_pending());
    }

    #[test]
    fn test_configure_failure_is_init_error() {
        let result = PioDacDriver::init(PioDacConfig::new(FakeDma::default()), 0);
        assert!(matches!(result, Err(PsgError::DriverInit(_))));
    }
}

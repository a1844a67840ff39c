//! WAV file output
//!
//! Writes the stream as 16-bit stereo PCM, recentering the unsigned
//! 12-bit samples around zero.

use super::OutputDriver;
use crate::{PsgError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, warn};

/// Output file
#[derive(Debug, Clone)]
pub struct WavConfig {
    /// Path of the file to create
    pub path: PathBuf,
}

impl WavConfig {
    /// Write to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WavConfig { path: path.into() }
    }
}

/// Convert an unsigned 12-bit sample to signed 16-bit
#[inline]
pub fn to_pcm16(sample: u16) -> i16 {
    ((sample.min(4095) as i32 - 2048) << 4) as i16
}

/// WAV file sink
pub struct WavDriver {
    writer: Option<WavWriter<BufWriter<File>>>,
    path: PathBuf,
    running: bool,
    frames: u64,
    faults: u32,
}

impl WavDriver {
    /// Frames written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Failed sample writes
    pub fn faults(&self) -> u32 {
        self.faults
    }

    fn finalize(&mut self) {
        let Some(writer) = self.writer.take() else {
            return;
        };
        match writer.finalize() {
            Ok(()) => info!(path = %self.path.display(), frames = self.frames, "WAV file written"),
            Err(err) => warn!(path = %self.path.display(), %err, "failed to finalize WAV file"),
        }
    }
}

impl OutputDriver for WavDriver {
    type Config = WavConfig;

    fn init(config: WavConfig, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(&config.path, spec).map_err(|e| {
            PsgError::DriverInit(format!(
                "failed to create WAV file {}: {}",
                config.path.display(),
                e
            ))
        })?;
        Ok(WavDriver {
            writer: Some(writer),
            path: config.path,
            running: false,
            frames: 0,
            faults: 0,
        })
    }

    fn start(&mut self) {
        self.running = self.writer.is_some();
    }

    fn stop(&mut self) {
        self.running = false;
        self.finalize();
    }

    fn write(&mut self, left: u16, right: u16) {
        if !self.running {
            return;
        }
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        let ok = writer.write_sample(to_pcm16(left)).is_ok()
            && writer.write_sample(to_pcm16(right)).is_ok();
        if ok {
            self.frames += 1;
        } else {
            self.faults = self.faults.saturating_add(1);
        }
    }
}

impl Drop for WavDriver {
    fn drop(&mut self) {
        self.finalize();
    }
}

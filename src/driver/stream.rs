//! Host audio output
//!
//! Frames go through a lock-free ring into a `rodio` source pulled by the
//! audio device thread. The device is opened on the real-time thread,
//! since the output stream cannot move between threads.

use super::OutputDriver;
use crate::queue::{channel, Consumer, Producer, Word};
use crate::{PsgError, Result};
use rodio::{OutputStream, Sink, Source};
use std::time::Duration;
use tracing::debug;

/// Frames buffered between the renderer and the device
pub const STREAM_BUFFER_FRAMES: usize = 8192;

/// One stereo frame in a ring slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StereoFrame {
    /// Left sample (12-bit)
    pub left: u16,
    /// Right sample (12-bit)
    pub right: u16,
}

impl Word for StereoFrame {
    #[inline]
    fn into_word(self) -> u64 {
        ((self.left as u64) << 16) | self.right as u64
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        StereoFrame {
            left: (word >> 16) as u16,
            right: word as u16,
        }
    }
}

/// Host audio options
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Output gain (1.0 = unity)
    pub volume: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig { volume: 1.0 }
    }
}

/// Source reading frames from the ring
struct FrameSource {
    frames: Consumer<StereoFrame, STREAM_BUFFER_FRAMES>,
    sample_rate: u32,
    /// Right sample of the frame being played
    pending: Option<f32>,
}

#[inline]
fn to_f32(sample: u16) -> f32 {
    (sample as f32 - 2048.0) / 2048.0
}

impl Iterator for FrameSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if let Some(right) = self.pending.take() {
            return Some(right);
        }
        // underrun plays silence so the stream stays alive
        let frame = self.frames.pop().unwrap_or(StereoFrame {
            left: 2048,
            right: 2048,
        });
        self.pending = Some(to_f32(frame.right));
        Some(to_f32(frame.left))
    }
}

impl Source for FrameSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Renderer side of the device ring
#[derive(Debug)]
struct FrameFeed {
    frames: Producer<StereoFrame, STREAM_BUFFER_FRAMES>,
    running: bool,
    overruns: u64,
}

impl FrameFeed {
    fn new(frames: Producer<StereoFrame, STREAM_BUFFER_FRAMES>) -> Self {
        FrameFeed {
            frames,
            running: false,
            overruns: 0,
        }
    }

    #[inline]
    fn push(&mut self, left: u16, right: u16) {
        if !self.running {
            return;
        }
        if !self.frames.push(StereoFrame { left, right }) {
            self.overruns += 1;
        }
    }
}

/// System audio device sink
pub struct StreamDriver {
    _stream: OutputStream,
    sink: Sink,
    feed: FrameFeed,
}

impl StreamDriver {
    /// Frames dropped because the device fell behind
    pub fn overruns(&self) -> u64 {
        self.feed.overruns
    }

    /// Whether frames are being accepted
    pub fn is_running(&self) -> bool {
        self.feed.running
    }
}

impl OutputDriver for StreamDriver {
    type Config = StreamConfig;

    fn init(config: StreamConfig, sample_rate: u32) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| PsgError::AudioDevice(format!("failed to open audio output: {e}")))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| PsgError::AudioDevice(format!("failed to create audio sink: {e}")))?;

        let (producer, consumer) = channel::<StereoFrame, STREAM_BUFFER_FRAMES>();
        sink.pause();
        sink.set_volume(config.volume);
        sink.append(FrameSource {
            frames: consumer,
            sample_rate,
            pending: None,
        });
        debug!(sample_rate, "audio device opened");

        Ok(StreamDriver {
            _stream: stream,
            sink,
            feed: FrameFeed::new(producer),
        })
    }

    fn start(&mut self) {
        self.feed.running = true;
        self.sink.play();
    }

    fn stop(&mut self) {
        self.feed.running = false;
        self.sink.pause();
    }

    #[inline]
    fn write(&mut self, left: u16, right: u16) {
        self.feed.push(left, right);
    }
}

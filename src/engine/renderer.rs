//! Sample Renderer
//!
//! Runs once per sample: renders one stereo pair from the voice state
//! under the critical section, then hands it to the output driver outside
//! of it.

use super::EngineStats;
use crate::driver::OutputDriver;
use crate::sync::{lock_api::RawMutex, DefaultSection, VoiceLock};
use std::sync::Arc;

/// Render side of the real-time context
pub struct Renderer<D: OutputDriver, R: RawMutex = DefaultSection> {
    voices: Arc<VoiceLock<R>>,
    stats: Arc<EngineStats>,
    driver: D,
}

impl<D: OutputDriver, R: RawMutex> Renderer<D, R> {
    /// Bind the voice state to an initialized driver
    pub fn new(voices: Arc<VoiceLock<R>>, stats: Arc<EngineStats>, driver: D) -> Self {
        Renderer {
            voices,
            stats,
            driver,
        }
    }

    /// One sample-rate timer tick
    #[inline]
    pub fn tick(&mut self) -> (u16, u16) {
        let (left, right) = self.voices.lock().render_one();
        self.driver.write(left, right);
        self.stats.record_rendered();
        (left, right)
    }

    /// Output driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Output driver, mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Take the driver back
    pub fn into_driver(self) -> D {
        self.driver
    }
}

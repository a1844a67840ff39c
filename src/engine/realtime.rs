//! Real-time context
//!
//! [`RealtimeCore`] owns both timer callbacks and interleaves them
//! deterministically: one step per sample, with the dispatcher running
//! ahead of the render on steps where a millisecond boundary falls. On the
//! host it is driven by the `psg-realtime` thread ([`RealtimeCore::run`])
//! or directly by the caller for offline rendering.

use super::{DispatchClock, Dispatcher, EngineStats, Pacing, Renderer, StatsSnapshot, TickCounter};
use crate::driver::OutputDriver;
use crate::sync::{lock_api::RawMutex, DefaultSection, VoiceGuard, VoiceLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Dispatcher, renderer and their shared clock
pub struct RealtimeCore<D: OutputDriver, R: RawMutex = DefaultSection> {
    dispatcher: Dispatcher<R>,
    renderer: Renderer<D, R>,
    clock: DispatchClock,
    pacing: Pacing,
    voices: Arc<VoiceLock<R>>,
    ticks: Arc<TickCounter>,
    stats: Arc<EngineStats>,
    running: Arc<AtomicBool>,
    started: bool,
}

impl<D: OutputDriver, R: RawMutex> fmt::Debug for RealtimeCore<D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeCore")
            .field("now", &self.now())
            .field("dispatch_ticks", &self.clock.ticks())
            .field("pending", &self.pending())
            .field("pacing", &self.pacing)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl<D: OutputDriver, R: RawMutex> RealtimeCore<D, R> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        dispatcher: Dispatcher<R>,
        renderer: Renderer<D, R>,
        clock: DispatchClock,
        pacing: Pacing,
        voices: Arc<VoiceLock<R>>,
        ticks: Arc<TickCounter>,
        stats: Arc<EngineStats>,
        running: Arc<AtomicBool>,
    ) -> Self {
        RealtimeCore {
            dispatcher,
            renderer,
            clock,
            pacing,
            voices,
            ticks,
            stats,
            running,
            started: false,
        }
    }

    /// Start the output driver (idempotent)
    pub fn start(&mut self) {
        if !self.started {
            self.renderer.driver_mut().start();
            self.started = true;
        }
    }

    /// One sample instant; returns true if the dispatcher ran
    #[inline]
    pub fn step(&mut self) -> bool {
        let dispatched = self.clock.clock();
        if dispatched {
            self.dispatcher.tick();
        }
        self.renderer.tick();
        dispatched
    }

    /// Render `samples` sample pairs
    pub fn run_samples(&mut self, samples: u64) {
        for _ in 0..samples {
            self.step();
        }
    }

    /// Render `ms` whole dispatch periods
    pub fn run_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            loop {
                self.step();
                if self.clock.fires_next() {
                    break;
                }
            }
        }
    }

    /// Run until the producer stops the engine
    pub fn run(&mut self) {
        self.start();
        let origin = Instant::now();
        let mut ticks: u64 = 0;

        while self.running.load(Ordering::Acquire) {
            if !self.step() {
                continue;
            }
            ticks += 1;
            if self.pacing == Pacing::Realtime {
                let deadline = origin + Duration::from_millis(ticks);
                let now = Instant::now();
                if deadline > now {
                    thread::sleep(deadline - now);
                }
            }
        }
    }

    /// Current dispatch tick
    pub fn now(&self) -> u16 {
        self.ticks.now()
    }

    /// Dispatch ticks run so far
    pub fn dispatch_ticks(&self) -> u64 {
        self.clock.ticks()
    }

    /// Packets still queued
    pub fn pending(&self) -> usize {
        self.dispatcher.pending()
    }

    /// Counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Lock the voice state for inspection
    ///
    /// Drop the guard before stepping this core or, with the default
    /// section, any other core in the process; see
    /// [`DefaultSection`](crate::sync::DefaultSection).
    pub fn voices(&self) -> VoiceGuard<'_, R> {
        self.voices.lock()
    }

    /// Output driver
    pub fn driver(&self) -> &D {
        self.renderer.driver()
    }

    /// Stop the driver and hand it back
    pub fn shutdown(mut self) -> D {
        self.running.store(false, Ordering::Release);
        if self.started {
            self.renderer.driver_mut().stop();
        }
        self.renderer.into_driver()
    }
}

#[cfg(test)]
mod tests {
    use crate::driver::NullDriver;
    use crate::engine::{Engine, EngineConfig};
    use crate::PsgError;

    #[test]
    fn test_debug_reports_progress() {
        let (psg, mut core) = Engine::offline::<NullDriver>(EngineConfig::default(), ()).unwrap();
        core.run_ms(3);
        let text = format!("{core:?}");
        assert!(text.contains("now: 3"), "{text}");
        assert!(text.contains("started: true"), "{text}");
        assert!(format!("{psg:?}").starts_with("Psg"));
    }

    #[test]
    fn test_build_errors_are_inspectable() {
        let config = EngineConfig {
            chip_clock: 1,
            ..EngineConfig::default()
        };
        let err = Engine::offline::<NullDriver>(config, ()).unwrap_err();
        assert!(matches!(err, PsgError::Config(_)));
    }
}

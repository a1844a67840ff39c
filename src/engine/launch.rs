//! Engine construction and launch
//!
//! Startup is the only place that can fail. [`Engine::build`] wires the
//! queue, the voice state and the driver together on the calling thread;
//! [`Engine::launch`] does the same on a dedicated `psg-realtime` thread:
//!
//! 1. spawn the thread, which blocks waiting for its init parameters
//! 2. hand the parameters over through a zero-capacity rendezvous
//! 3. the thread initializes the driver and reports back
//! 4. on success the thread starts its timers; on failure it exits and the
//!    error is returned to the caller

use super::{
    DispatchClock, Dispatcher, EngineConfig, EngineStats, Psg, RealtimeCore, Renderer,
    SharedHandles, TickCounter,
};
use crate::driver::OutputDriver;
use crate::psg::Voices;
use crate::queue::{channel, Consumer, Packet};
use crate::sync::{lock_api::RawMutex, DefaultSection, VoiceLock};
use crate::{PsgError, Result};
use std::marker::PhantomData;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

/// Name of the host real-time thread
pub const REALTIME_THREAD_NAME: &str = "psg-realtime";

/// Everything the real-time context needs, handed over once at startup
struct InitParams<R: RawMutex> {
    config: EngineConfig,
    consumer: Consumer<Packet>,
    voices: Arc<VoiceLock<R>>,
    shared: SharedHandles,
}

impl<R: RawMutex> InitParams<R> {
    fn into_core<D: OutputDriver>(self, driver: D) -> RealtimeCore<D, R> {
        let SharedHandles {
            ticks,
            stats,
            running,
        } = self.shared;
        let dispatcher = Dispatcher::new(
            self.consumer,
            Arc::clone(&self.voices),
            Arc::clone(&ticks),
            Arc::clone(&stats),
        );
        let renderer = Renderer::new(Arc::clone(&self.voices), Arc::clone(&stats), driver);
        RealtimeCore::new(
            dispatcher,
            renderer,
            DispatchClock::new(self.config.sample_rate),
            self.config.pacing,
            self.voices,
            ticks,
            stats,
            running,
        )
    }
}

/// Engine builder, generic over the critical section guarding the voices
///
/// ```no_run
/// use pico_psg::driver::NullDriver;
/// use pico_psg::engine::{Engine, EngineConfig};
/// use pico_psg::sync::MaskingSection;
///
/// let (mut psg, mut core) = Engine::<MaskingSection>::new(EngineConfig::default())
///     .build::<NullDriver>(())
///     .unwrap();
/// psg.enqueue(0, 0x08, 0x0F);
/// core.run_ms(10);
/// ```
#[derive(Debug)]
pub struct Engine<R = DefaultSection> {
    config: EngineConfig,
    _section: PhantomData<fn() -> R>,
}

impl Engine<DefaultSection> {
    /// Build an engine driven by the caller (no thread)
    pub fn offline<D: OutputDriver>(
        config: EngineConfig,
        driver_config: D::Config,
    ) -> Result<(Psg, RealtimeCore<D>)> {
        Self::new(config).build(driver_config)
    }
}

impl<R: RawMutex + Send + Sync + 'static> Engine<R> {
    /// Start from a configuration
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            _section: PhantomData,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn wire_up(&self) -> (Psg, InitParams<R>) {
        let (producer, consumer) = channel();
        let voices = Voices::new(self.config.chip_clock, self.config.sample_rate);
        let shared = SharedHandles {
            ticks: Arc::new(TickCounter::new()),
            stats: Arc::new(EngineStats::new()),
            running: Arc::new(AtomicBool::new(true)),
        };
        let params = InitParams {
            config: self.config,
            consumer,
            voices: Arc::new(VoiceLock::<R>::new(voices)),
            shared: shared.clone(),
        };
        (Psg::new(producer, shared, None), params)
    }

    /// Initialize the driver here and return both halves
    ///
    /// The returned core is started; step it with
    /// [`RealtimeCore::run_samples`] / [`RealtimeCore::run_ms`].
    pub fn build<D: OutputDriver>(
        self,
        driver_config: D::Config,
    ) -> Result<(Psg, RealtimeCore<D, R>)> {
        self.config.validate()?;
        let driver = D::init(driver_config, self.config.sample_rate).map_err(|err| {
            error!(%err, "output driver init failed");
            err
        })?;
        let (psg, params) = self.wire_up();
        let mut core = params.into_core(driver);
        core.start();
        Ok((psg, core))
    }

    /// Spawn the real-time context and hand back the producer handle
    pub fn launch<D: OutputDriver + 'static>(self, driver_config: D::Config) -> Result<Psg> {
        self.config.validate()?;
        let (mut psg, params) = self.wire_up();

        let (param_tx, param_rx) = mpsc::sync_channel(0);
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let worker = thread::Builder::new()
            .name(REALTIME_THREAD_NAME.into())
            .spawn(move || realtime_main::<D, R>(param_rx, ready_tx))?;
        info!(
            sample_rate = self.config.sample_rate,
            chip_clock = self.config.chip_clock,
            "launching real-time context"
        );

        if param_tx.send((params, driver_config)).is_err() {
            let _ = worker.join();
            return Err(PsgError::Launch(
                "real-time context exited before the handshake".into(),
            ));
        }

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("real-time context running");
                psg.attach(worker);
                Ok(psg)
            }
            Ok(Err(err)) => {
                error!(%err, "output driver init failed");
                let _ = worker.join();
                Err(err)
            }
            Err(_) => {
                let _ = worker.join();
                Err(PsgError::Launch(
                    "real-time context exited during the handshake".into(),
                ))
            }
        }
    }
}

/// Launch the real-time context with the default critical section
pub fn launch<D: OutputDriver + 'static>(
    config: EngineConfig,
    driver_config: D::Config,
) -> Result<Psg> {
    Engine::<DefaultSection>::new(config).launch::<D>(driver_config)
}

fn realtime_main<D: OutputDriver, R: RawMutex>(
    params: Receiver<(InitParams<R>, D::Config)>,
    ready: SyncSender<Result<()>>,
) -> Result<()> {
    let (params, driver_config) = params
        .recv()
        .map_err(|_| PsgError::Launch("no init parameters received".into()))?;
    debug!("init parameters received");

    let driver = match D::init(driver_config, params.config.sample_rate) {
        Ok(driver) => driver,
        Err(err) => {
            // the launcher owns the error; the timers never start
            let _ = ready.send(Err(err));
            return Ok(());
        }
    };

    let mut core = params.into_core(driver);
    core.start();
    if ready.send(Ok(())).is_err() {
        core.shutdown();
        return Err(PsgError::Launch("launcher went away".into()));
    }

    core.run();
    core.shutdown();
    debug!("real-time context stopped");
    Ok(())
}

//! Engine Domain
//!
//! Ties the command queue, the voice state and an output driver into the
//! two-context engine:
//!
//! - Producer context: [`Psg`] handle, stamps and pushes packets
//! - Real-time context: [`RealtimeCore`], a [`Dispatcher`] at 1 kHz and a
//!   [`Renderer`] at the sample rate, interleaved by a [`DispatchClock`]
//!
//! The voice state is the only thing both real-time callbacks touch, and
//! only through the critical section. Use [`launch`] for a live engine on
//! its own thread, or [`Engine::offline`] to step the real-time side
//! yourself.

mod clock;
mod config;
mod dispatcher;
mod launch;
mod producer;
mod realtime;
mod renderer;
pub mod script;
mod stats;
mod tick;

pub use clock::{DispatchClock, DISPATCH_RATE};
pub use config::{EngineConfig, Pacing, CHIP_CLOCK_RANGE, SAMPLE_RATE_RANGE};
pub use dispatcher::Dispatcher;
pub use launch::{launch, Engine, REALTIME_THREAD_NAME};
pub use producer::Psg;
pub use realtime::RealtimeCore;
pub use renderer::Renderer;
pub use script::{Command, Script, ScriptEvent, Sequencer};
pub use stats::{EngineStats, StatsSnapshot};
pub use tick::{TickCounter, MAX_DELAY_TICKS};

pub(crate) use producer::SharedHandles;

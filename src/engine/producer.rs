//! Producer handle
//!
//! [`Psg`] is what the scripting side holds: it stamps packets with the
//! current tick plus a delay and pushes them into the queue. Nothing is
//! ever read back from the real-time context except counters.

use super::{EngineStats, StatsSnapshot, TickCounter};
use crate::queue::{Packet, Producer, Waveform};
use crate::{PsgError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Handles shared by the producer and the real-time context
#[derive(Debug, Clone)]
pub(crate) struct SharedHandles {
    pub(crate) ticks: Arc<TickCounter>,
    pub(crate) stats: Arc<EngineStats>,
    pub(crate) running: Arc<AtomicBool>,
}

/// Producer side of a running engine
///
/// Dropping the handle stops the real-time context.
#[derive(Debug)]
pub struct Psg {
    producer: Producer<Packet>,
    shared: SharedHandles,
    worker: Option<JoinHandle<Result<()>>>,
    /// Inside a burst of rejected pushes
    overflowing: bool,
}

impl Psg {
    pub(crate) fn new(
        producer: Producer<Packet>,
        shared: SharedHandles,
        worker: Option<JoinHandle<Result<()>>>,
    ) -> Self {
        Psg {
            producer,
            shared,
            worker,
            overflowing: false,
        }
    }

    pub(crate) fn attach(&mut self, worker: JoinHandle<Result<()>>) {
        self.worker = Some(worker);
    }

    /// Current dispatch tick
    pub fn now(&self) -> u16 {
        self.shared.ticks.now()
    }

    /// Queue a register write `delay` ticks from now
    ///
    /// Returns `false` if the queue is full; the write is dropped.
    pub fn enqueue(&mut self, delay: u16, reg: u8, val: u8) -> bool {
        self.send(delay, Packet::register_write(0, reg, val))
    }

    /// Queue a vibrato change (depth in cents, rate in 0.1 Hz)
    pub fn set_lfo(&mut self, delay: u16, channel: u8, depth: u8, rate: u8) -> bool {
        self.send(delay, Packet::lfo(0, channel, depth, rate))
    }

    /// Queue a mute change
    pub fn set_mute(&mut self, delay: u16, channel: u8, muted: bool) -> bool {
        self.send(delay, Packet::mute(0, channel, muted))
    }

    /// Queue a pan change (1 = hard left, 15 = hard right)
    pub fn set_pan(&mut self, delay: u16, channel: u8, pan: u8) -> bool {
        self.send(delay, Packet::pan(0, channel, pan))
    }

    /// Queue a waveform change
    pub fn set_timbre(&mut self, delay: u16, channel: u8, waveform: Waveform) -> bool {
        self.send(delay, Packet::timbre(0, channel, waveform))
    }

    /// Queue a legato change
    pub fn set_legato(&mut self, delay: u16, channel: u8, legato: bool) -> bool {
        self.send(delay, Packet::legato(0, channel, legato))
    }

    /// Queue `packet` `delay` ticks from now (its own tick is replaced)
    pub fn send(&mut self, delay: u16, packet: Packet) -> bool {
        let tick = self.shared.ticks.stamp(delay);
        self.push_at(tick, packet)
    }

    /// Queue `packet` for an absolute tick
    pub fn push_at(&mut self, tick: u16, packet: Packet) -> bool {
        let packet = Packet { tick, ..packet };
        if self.producer.push(packet) {
            self.overflowing = false;
            return true;
        }

        self.shared.stats.record_drop();
        if !self.overflowing {
            warn!("command queue full, dropping packets");
            self.overflowing = true;
        }
        debug!(%packet, "dropped");
        false
    }

    /// Free queue slots
    pub fn free(&self) -> usize {
        self.producer.free()
    }

    /// Counters
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Whether the real-time context is still running
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Stop the real-time context and wait for it to finish
    pub fn stop(&mut self) -> Result<()> {
        self.shared.running.store(false, Ordering::Release);
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        info!("stopping real-time context");
        worker
            .join()
            .map_err(|_| PsgError::Launch("real-time context panicked".into()))?
    }
}

impl Drop for Psg {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

//! Command Dispatcher
//!
//! Runs once per millisecond: advances the global tick, steps the vibrato
//! LFOs, then applies every queued packet that has come due, in FIFO order.
//! Each packet is applied inside its own critical section so a render tick
//! can slip in between two packets but never in the middle of one.

use super::{EngineStats, TickCounter};
use crate::queue::{Consumer, Packet};
use crate::sync::{lock_api::RawMutex, DefaultSection, VoiceLock};
use std::sync::Arc;

/// Consumer side of the command queue
pub struct Dispatcher<R: RawMutex = DefaultSection> {
    consumer: Consumer<Packet>,
    voices: Arc<VoiceLock<R>>,
    ticks: Arc<TickCounter>,
    stats: Arc<EngineStats>,
}

impl<R: RawMutex> Dispatcher<R> {
    /// Bind a queue consumer to the shared voice state
    pub fn new(
        consumer: Consumer<Packet>,
        voices: Arc<VoiceLock<R>>,
        ticks: Arc<TickCounter>,
        stats: Arc<EngineStats>,
    ) -> Self {
        Dispatcher {
            consumer,
            voices,
            ticks,
            stats,
        }
    }

    /// One 1 kHz timer tick; returns the number of packets applied
    pub fn tick(&mut self) -> usize {
        let now = self.ticks.advance();
        self.voices.lock().tick_lfo();

        let mut applied = 0;
        while let Some(packet) = self.consumer.peek() {
            if !packet.is_due(now) {
                break;
            }
            self.consumer.pop();
            self.voices.lock().apply(&packet);
            self.stats.record_applied();
            applied += 1;
        }
        applied
    }

    /// Current tick
    pub fn now(&self) -> u16 {
        self.ticks.now()
    }

    /// Packets still waiting
    pub fn pending(&self) -> usize {
        self.consumer.len()
    }
}

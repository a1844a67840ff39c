//! Engine statistics
//!
//! Plain atomic counters written by whichever side observes the event and
//! readable from anywhere.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters
#[derive(Debug, Default)]
pub struct EngineStats {
    dropped: AtomicU64,
    applied: AtomicU64,
    rendered: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Packets rejected because the queue was full
    pub dropped: u64,
    /// Packets applied by the dispatcher
    pub applied: u64,
    /// Sample pairs rendered
    pub rendered: u64,
}

impl EngineStats {
    /// All counters at zero
    pub const fn new() -> Self {
        EngineStats {
            dropped: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            rendered: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rendered(&self) {
        self.rendered.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dropped: self.dropped.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            rendered: self.rendered.load(Ordering::Relaxed),
        }
    }
}

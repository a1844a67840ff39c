//! Critical Sections
//!
//! Mutual exclusion between the command-apply path and the sample-render
//! path. Both contexts may be interrupt handlers on the same core, or run on
//! different cores sharing the same memory, so every section also masks
//! local interrupts for its (short, bounded) hold time.
//!
//! Two environments present the same `enter`/`exit` contract:
//! - [`SpinlockSection`] - hardware spinlock bank plus local IRQ masking,
//!   for targets with truly concurrent cores
//! - [`MaskingSection`] - local IRQ masking plus a compare-and-set guard,
//!   for targets without hardware spinlocks
//!
//! Both also implement [`lock_api::RawMutex`], so the voice state is held in
//! a [`VoiceLock`] and released by guard drop on every exit path.

mod irq;
mod masking;
mod spinlock;

pub use irq::{HostIrq, InterruptMask, IrqState};
pub use masking::MaskingSection;
pub use parking_lot::lock_api;
pub use spinlock::{SpinlockSection, SPINLOCK_COUNT};

use crate::psg::Voices;

/// Opaque value returned by [`CriticalSection::enter`]
///
/// Captures the interrupt state that [`CriticalSection::exit`] restores.
#[must_use = "a critical section token must be handed back to exit()"]
#[derive(Debug)]
pub struct Token {
    pub(crate) irq: IrqState,
}

/// Architecture-level mutual exclusion primitive
///
/// Not a general purpose lock: hold times must stay at a single register
/// field update or one rendered sample.
pub trait CriticalSection: Send + Sync {
    /// Mask local interrupts and acquire the section
    fn enter(&self) -> Token;

    /// Release the section and restore the interrupt state captured by `enter`
    fn exit(&self, token: Token);
}

/// Critical section used by the engine unless another one is requested
///
/// Hardware spinlock 0 is one lock for the whole process, so every engine
/// built with this section contends on it. A thread holding one engine's
/// guard must not step another such engine: the second lock spins forever.
/// Engines that need to be locked independently use [`MaskingSection`] or
/// a distinct `SpinlockSection<ID>`.
pub type DefaultSection = SpinlockSection<0>;

/// Voice state guarded by a critical section
pub type VoiceLock<R = DefaultSection> = lock_api::Mutex<R, Voices>;

/// Scoped access to the guarded voice state
pub type VoiceGuard<'a, R = DefaultSection> = lock_api::MutexGuard<'a, R, Voices>;

//! Hardware spinlock backed critical section
//!
//! Models the bank of hardware spinlocks found on dual-core parts: a fixed
//! set of numbered locks visible to every core, claimed with a single
//! read-modify-write and released with a store.

use super::{CriticalSection, HostIrq, InterruptMask, IrqState, Token};
use parking_lot::lock_api::{GuardNoSend, RawMutex};
use std::hint;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

/// Number of hardware spinlocks in the bank
pub const SPINLOCK_COUNT: usize = 32;

#[allow(clippy::declare_interior_mutable_const)]
const UNCLAIMED: AtomicBool = AtomicBool::new(false);

static SPINLOCKS: [AtomicBool; SPINLOCK_COUNT] = [UNCLAIMED; SPINLOCK_COUNT];

#[inline]
fn try_claim(id: usize) -> bool {
    SPINLOCKS[id]
        .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
        .is_ok()
}

#[inline]
fn release(id: usize) {
    SPINLOCKS[id].store(false, Ordering::Release);
}

/// Critical section using hardware spinlock `ID` plus local IRQ masking
///
/// Interrupts are masked before spinning so the holder can never be
/// preempted by the other real-time handler on its own core.
#[derive(Debug)]
pub struct SpinlockSection<const ID: usize, I: InterruptMask = HostIrq> {
    /// IRQ state of the current holder, parked for `RawMutex::unlock`
    saved: AtomicBool,
    _irq: PhantomData<fn() -> I>,
}

impl<const ID: usize, I: InterruptMask> SpinlockSection<ID, I> {
    const VALID_ID: () = assert!(ID < SPINLOCK_COUNT, "spinlock id out of range");

    /// Create a section bound to hardware spinlock `ID`
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_ID;
        Self {
            saved: AtomicBool::new(false),
            _irq: PhantomData,
        }
    }

    /// Hardware spinlock number used by this section
    pub const fn id(&self) -> usize {
        ID
    }
}

impl<const ID: usize, I: InterruptMask> Default for SpinlockSection<ID, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ID: usize, I: InterruptMask> CriticalSection for SpinlockSection<ID, I> {
    #[inline]
    fn enter(&self) -> Token {
        let irq = I::disable();
        while !try_claim(ID) {
            hint::spin_loop();
        }
        Token { irq }
    }

    #[inline]
    fn exit(&self, token: Token) {
        release(ID);
        I::restore(token.irq);
    }
}

unsafe impl<const ID: usize, I: InterruptMask> RawMutex for SpinlockSection<ID, I> {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self::new();

    // The parked IRQ state belongs to the locking context
    type GuardMarker = GuardNoSend;

    fn lock(&self) {
        let token = self.enter();
        self.saved.store(token.irq.was_enabled(), Ordering::Relaxed);
    }

    fn try_lock(&self) -> bool {
        let irq = I::disable();
        if try_claim(ID) {
            self.saved.store(irq.was_enabled(), Ordering::Relaxed);
            true
        } else {
            I::restore(irq);
            false
        }
    }

    unsafe fn unlock(&self) {
        let irq = IrqState::from_flag(self.saved.load(Ordering::Relaxed));
        self.exit(Token { irq });
    }
}

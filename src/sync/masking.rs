//! IRQ-masking critical section for targets without hardware spinlocks

use super::{CriticalSection, HostIrq, InterruptMask, IrqState, Token};
use parking_lot::lock_api::{GuardNoSend, RawMutex};
use std::hint;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

/// Critical section using local IRQ masking plus a compare-and-set guard
#[derive(Debug)]
pub struct MaskingSection<I: InterruptMask = HostIrq> {
    guard: AtomicBool,
    saved: AtomicBool,
    _irq: PhantomData<fn() -> I>,
}

impl<I: InterruptMask> MaskingSection<I> {
    /// Create an unlocked section
    pub const fn new() -> Self {
        Self {
            guard: AtomicBool::new(false),
            saved: AtomicBool::new(false),
            _irq: PhantomData,
        }
    }

    #[inline]
    fn try_claim(&self) -> bool {
        self.guard
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }
}

impl<I: InterruptMask> Default for MaskingSection<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: InterruptMask> CriticalSection for MaskingSection<I> {
    #[inline]
    fn enter(&self) -> Token {
        let irq = I::disable();
        while !self.try_claim() {
            hint::spin_loop();
        }
        Token { irq }
    }

    #[inline]
    fn exit(&self, token: Token) {
        self.guard.store(false, Ordering::Release);
        I::restore(token.irq);
    }
}

unsafe impl<I: InterruptMask> RawMutex for MaskingSection<I> {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self::new();

    type GuardMarker = GuardNoSend;

    fn lock(&self) {
        let token = self.enter();
        self.saved.store(token.irq.was_enabled(), Ordering::Relaxed);
    }

    fn try_lock(&self) -> bool {
        let irq = I::disable();
        // strong CAS: a spurious failure here would be reported as contention
        if self
            .guard
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
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

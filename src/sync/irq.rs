//! Local interrupt masking

use std::cell::Cell;

/// Interrupt enable state captured when masking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqState {
    was_enabled: bool,
}

impl IrqState {
    /// Rebuild a captured state from a parked flag
    pub(crate) fn from_flag(was_enabled: bool) -> Self {
        Self { was_enabled }
    }

    /// Whether interrupts were enabled before masking
    pub fn was_enabled(&self) -> bool {
        self.was_enabled
    }
}

/// Local (per execution context) interrupt masking
///
/// `disable` returns the prior state; `restore` puts it back, so nested
/// sections only re-enable interrupts at the outermost exit.
pub trait InterruptMask {
    /// Disable local interrupts, returning the previous state
    fn disable() -> IrqState;

    /// Restore the state returned by a matching `disable`
    fn restore(state: IrqState);
}

thread_local! {
    static IRQ_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Host model of a core's interrupt enable flag
///
/// Each OS thread stands in for one execution context and carries its own
/// flag, which is what the real-time timers consult on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostIrq;

impl HostIrq {
    /// Whether local interrupts are currently enabled on this context
    pub fn enabled() -> bool {
        IRQ_ENABLED.with(|flag| flag.get())
    }
}

impl InterruptMask for HostIrq {
    #[inline]
    fn disable() -> IrqState {
        IrqState {
            was_enabled: IRQ_ENABLED.with(|flag| flag.replace(false)),
        }
    }

    #[inline]
    fn restore(state: IrqState) {
        if state.was_enabled {
            IRQ_ENABLED.with(|flag| flag.set(true));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_masking_restores_outermost_only() {
        assert!(HostIrq::enabled());
        let outer = HostIrq::disable();
        let inner = HostIrq::disable();
        assert!(outer.was_enabled());
        assert!(!inner.was_enabled());

        HostIrq::restore(inner);
        assert!(!HostIrq::enabled());
        HostIrq::restore(outer);
        assert!(HostIrq::enabled());
    }
}

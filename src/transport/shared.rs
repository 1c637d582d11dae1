// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! State shared between one interrupt handler and the main loop.
//!
//! Each [`IrqCell`] belongs to exactly one interrupt source. The handler of that source accesses
//! the value directly; the main loop accesses it with only that source masked, so unrelated
//! interrupts (servo PWM, ADC) keep running during the critical section.

use core::cell::UnsafeCell;
use core::sync::atomic::{compiler_fence, Ordering};

/// Masks and unmasks the interrupt source that owns an [`IrqCell`].
pub trait IrqGate {
    /// Stop the owning interrupt from being serviced.
    fn mask(&self);

    /// Allow the owning interrupt again. Pending requests are serviced right away.
    fn unmask(&self);

    /// Called between polls while the main loop waits on the owner. Sleep until the next interrupt
    /// where the platform allows it.
    fn relax(&self) {
        core::hint::spin_loop();
    }
}

impl<G: IrqGate + ?Sized> IrqGate for &G {
    fn mask(&self) {
        (**self).mask()
    }

    fn unmask(&self) {
        (**self).unmask()
    }

    fn relax(&self) {
        (**self).relax()
    }
}

/// Interior-mutable cell guarded by masking a single interrupt source.
pub struct IrqCell<T> {
    value: UnsafeCell<T>,
}

// SAFETY: access is serialized by masking the owning interrupt (see `lock` / `with_owner`).
unsafe impl<T: Send> Sync for IrqCell<T> {}

impl<T> IrqCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
        }
    }

    /// Run `f` on the value with the owning interrupt masked. Not re-entrant.
    pub fn lock<G, R>(&self, gate: &G, f: impl FnOnce(&mut T) -> R) -> R
    where
        G: IrqGate + ?Sized,
    {
        gate.mask();
        compiler_fence(Ordering::SeqCst);
        // SAFETY: the only other accessor is the owning interrupt handler, which is masked.
        let result = f(unsafe { &mut *self.value.get() });
        compiler_fence(Ordering::SeqCst);
        gate.unmask();
        result
    }

    /// Run `f` on the value from the owning interrupt handler.
    ///
    /// # Safety
    ///
    /// Must only be called from the handler of the interrupt source masked by the gate used with
    /// [`IrqCell::lock`], and never while a `lock` or another `with_owner` on this cell is active
    /// in the same context.
    pub unsafe fn with_owner<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut *self.value.get())
    }

    /// Exclusive access without masking; the borrow proves nobody else holds the cell.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Default)]
    struct CountingGate {
        masked: Cell<bool>,
        masks: Cell<u32>,
    }

    impl IrqGate for CountingGate {
        fn mask(&self) {
            assert!(!self.masked.get(), "nested lock");
            self.masked.set(true);
            self.masks.set(self.masks.get() + 1);
        }

        fn unmask(&self) {
            assert!(self.masked.get());
            self.masked.set(false);
        }
    }

    #[test]
    fn lock_masks_only_for_the_closure() {
        let gate = CountingGate::default();
        let cell = IrqCell::new(0u32);

        let seen = cell.lock(&gate, |v| {
            assert!(gate.masked.get());
            *v += 5;
            *v
        });

        assert_eq!(seen, 5);
        assert!(!gate.masked.get());
        assert_eq!(gate.masks.get(), 1);
        assert_eq!(cell.into_inner(), 5);
    }

    #[test]
    fn owner_access_sees_main_loop_writes() {
        let gate = CountingGate::default();
        let cell = IrqCell::new([0u8; 4]);

        cell.lock(&gate, |v| v[1] = 7);
        let read = unsafe { cell.with_owner(|v| v[1]) };
        assert_eq!(read, 7);
        assert_eq!(gate.masks.get(), 1);
    }

    #[test]
    fn gate_by_reference() {
        let gate = CountingGate::default();
        let cell = IrqCell::new(1u8);
        let by_ref = &gate;
        cell.lock(&by_ref, |v| *v = 2);
        assert_eq!(gate.masks.get(), 1);
    }
}

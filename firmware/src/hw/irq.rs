// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Per-interrupt critical sections through the NVIC.

use cortex_m::{asm, peripheral::NVIC};
use stm32f7xx_hal::pac::Interrupt;

use rathing::transport::IrqGate;

/// Guards state owned by one interrupt source by masking only that source.
#[derive(Copy, Clone)]
pub struct NvicGate(pub Interrupt);

impl IrqGate for NvicGate {
    #[inline]
    fn mask(&self) {
        NVIC::mask(self.0);
    }

    #[inline]
    fn unmask(&self) {
        // SAFETY: every object the handler touches is behind an `IrqCell` or an atomic.
        unsafe { NVIC::unmask(self.0) };
    }

    /// Sleep until the next interrupt. The 50 Hz control tick bounds the wait.
    #[inline]
    fn relax(&self) {
        asm::wfi();
    }
}

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! ADC1 feedback scan using direct PAC register access.
//!
//! One channel is converted at a time. The end-of-conversion interrupt stores the result and
//! starts the next channel of the scan.

use stm32f7xx_hal::pac;

#[inline]
fn regs() -> &'static pac::adc1::RegisterBlock {
    unsafe { &*pac::ADC1::ptr() }
}

/// Configure ADC1 for interrupt-driven single conversions and start on `first_channel`.
pub fn init(_adc1: pac::ADC1, first_channel: u8) {
    let rcc = unsafe { &*pac::RCC::ptr() };
    rcc.apb2enr.modify(|_, w| w.adc1en().set_bit());

    let common = unsafe { &*pac::ADC_COMMON::ptr() };
    // ADC prescaler: PCLK2 / 4
    common.ccr.modify(|_, w| w.adcpre().div4());

    let adc = regs();
    adc.cr2.modify(|_, w| w.adon().clear_bit());

    // 12-bit, interrupt at end of conversion
    adc.cr1.modify(|_, w| w.res().bits(0b00).eocie().set_bit());
    adc.cr2.modify(|_, w| {
        w.cont().clear_bit();
        w.align().right();
        w.exten().disabled();
        w
    });

    // Longest sample time on every channel; the feedback sources are high impedance.
    adc.smpr1.write(|w| unsafe { w.bits(0x07FF_FFFF) });
    adc.smpr2.write(|w| unsafe { w.bits(0x3FFF_FFFF) });

    // Sequence length = 1 conversion
    adc.sqr1.modify(|_, w| w.l().bits(0));

    adc.cr2.modify(|_, w| w.adon().set_bit());
    start(first_channel);
}

/// Start converting `channel`.
pub fn start(channel: u8) {
    let adc = regs();
    adc.sqr3
        .modify(|_, w| unsafe { w.sq1().bits(channel & 0x1F) });
    adc.cr2.modify(|_, w| w.swstart().set_bit());
}

/// Result of the finished conversion. Reading it clears the interrupt flag.
#[inline]
pub fn take_result() -> u16 {
    regs().dr.read().data().bits() as u16
}

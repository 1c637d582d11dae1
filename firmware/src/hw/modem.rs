// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART2 link to the ESP8266 modem, driven from its interrupt.
//!
//! The HAL sets up clocks, pins and baud rate. After that the registers are accessed directly so
//! the transmit-empty interrupt can be switched on and off per byte.

use core::convert::Infallible;

use embedded_hal::serial;
use stm32f7xx_hal::{
    pac,
    serial::{Pins, Serial},
};

use rathing::transport::ModemLink;

#[inline]
fn regs() -> &'static pac::usart1::RegisterBlock {
    unsafe { &*pac::USART2::ptr() }
}

/// Handle on the configured USART2 registers.
pub struct ModemUsart {
    _private: (),
}

impl ModemUsart {
    /// Only one handle may exist, and it must not be used before [`init`].
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Next received byte, if any. Clears a receive overrun.
    pub fn read(&mut self) -> Option<u8> {
        let usart = regs();
        let isr = usart.isr.read();
        if isr.ore().bit_is_set() {
            usart.icr.write(|w| w.orecf().set_bit());
        }
        if isr.rxne().bit_is_set() {
            Some(usart.rdr.read().bits() as u8)
        } else {
            None
        }
    }

    /// Transmit-empty is flagged and its interrupt enabled.
    pub fn tx_pending(&self) -> bool {
        let usart = regs();
        usart.cr1.read().txeie().bit_is_set() && usart.isr.read().txe().bit_is_set()
    }
}

impl serial::Write<u8> for ModemUsart {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
        let usart = regs();
        if usart.isr.read().txe().bit_is_clear() {
            return Err(nb::Error::WouldBlock);
        }
        usart.tdr.write(|w| unsafe { w.bits(u32::from(word)) });
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        if regs().isr.read().tc().bit_is_set() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl ModemLink for ModemUsart {
    fn listen_tx_ready(&mut self) {
        regs().cr1.modify(|_, w| w.txeie().set_bit());
    }

    fn unlisten_tx_ready(&mut self) {
        regs().cr1.modify(|_, w| w.txeie().clear_bit());
    }
}

/// Take over a HAL-configured USART2 and enable its receive interrupt.
pub fn init<PINS: Pins<pac::USART2>>(serial: Serial<pac::USART2, PINS>) {
    drop(serial.split());
    regs().cr1.modify(|_, w| w.rxneie().set_bit().txeie().clear_bit());
}

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART1 debug terminal and `log` backend.
//!
//! Log records are formatted into a RAM ring and drained by the USART1 transmit-empty interrupt,
//! so logging never waits on the line. Records that do not fit are truncated.
//!
//! To access the terminal on the host machine, connect to the debug USB port and use
//! ```
//! $ screen /dev/tty.usbmodem* <baud_rate>
//! ```
//!
//! To close the debug terminal, press `Ctrl+A` then `Ctrl+\` then `y`.

use core::cell::RefCell;
use core::fmt::{self, Write};

use cortex_m::interrupt::{self, Mutex};
use log::{LevelFilter, Metadata, Record};
use stm32f7xx_hal::{
    pac,
    serial::{Pins, Serial},
};

use rathing::transport::Ring;

/// Bytes buffered for the debug line.
const TX_CAPACITY: usize = 256;

type TxRing = Ring<u8, TX_CAPACITY>;

static TX: Mutex<RefCell<TxRing>> = Mutex::new(RefCell::new(Ring::new(0)));
static LOGGER: DebugLog = DebugLog;

#[inline]
fn regs() -> &'static pac::usart1::RegisterBlock {
    unsafe { &*pac::USART1::ptr() }
}

struct RingWriter<'a>(&'a mut TxRing);

impl fmt::Write for RingWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &b in s.as_bytes() {
            self.0.try_push(b).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

pub struct DebugLog;

impl DebugLog {
    /// Take over a HAL-configured USART1 and route `log` output to it.
    pub fn install<PINS: Pins<pac::USART1>>(serial: Serial<pac::USART1, PINS>, level: LevelFilter) {
        drop(serial.split());
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(level);
        }
    }
}

impl log::Log for DebugLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        interrupt::free(|cs| {
            let mut ring = TX.borrow(cs).borrow_mut();
            let _ = write!(
                RingWriter(&mut ring),
                "[{}] {}\r\n",
                record.level(),
                record.args()
            );
            regs().cr1.modify(|_, w| w.txeie().set_bit());
        });
    }

    fn flush(&self) {}
}

/// USART1 interrupt body: move one buffered byte to the line.
pub fn on_interrupt() {
    let usart = regs();
    if usart.isr.read().txe().bit_is_clear() {
        return;
    }
    interrupt::free(|cs| match TX.borrow(cs).borrow_mut().pop() {
        Some(b) => usart.tdr.write(|w| unsafe { w.bits(u32::from(b)) }),
        None => usart.cr1.modify(|_, w| w.txeie().clear_bit()),
    });
}

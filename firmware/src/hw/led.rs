// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Battery level LEDs.

use embedded_hal::digital::v2::OutputPin;

/// Whether the LED is driven active-high or active-low on the board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

/// LED abstraction that remembers its active level and last known state.
pub struct Led<PIN: OutputPin> {
    pin: PIN,
    active: ActiveLevel,
    is_on: bool,
}

impl<PIN: OutputPin> Led<PIN> {
    /// Create an LED wrapper, initializing it to OFF.
    pub fn new(pin: PIN, active: ActiveLevel) -> Self {
        let mut led = Self {
            pin,
            active,
            is_on: true,
        };
        led.set(false);
        led
    }

    pub fn active_high(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::High)
    }

    /// Drive the LED logically ON (true) or OFF (false). Unchanged state is not rewritten.
    pub fn set(&mut self, on: bool) {
        if on == self.is_on {
            return;
        }
        let high = on == (self.active == ActiveLevel::High);
        if high {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
        self.is_on = on;
    }
}

/// Three LEDs showing the battery level; bit `n` of a mask drives LED `n`.
pub struct LedBar<L0: OutputPin, L1: OutputPin, L2: OutputPin> {
    low: Led<L0>,
    medium: Led<L1>,
    high: Led<L2>,
}

impl<L0: OutputPin, L1: OutputPin, L2: OutputPin> LedBar<L0, L1, L2> {
    pub fn new(low: L0, medium: L1, high: L2) -> Self {
        Self {
            low: Led::active_high(low),
            medium: Led::active_high(medium),
            high: Led::active_high(high),
        }
    }

    pub fn show(&mut self, mask: u8) {
        self.low.set(mask & 0b001 != 0);
        self.medium.set(mask & 0b010 != 0);
        self.high.set(mask & 0b100 != 0);
    }
}

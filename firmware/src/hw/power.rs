// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Charger inputs and converter shutdown.

use stm32f7xx_hal::gpio::{gpiod, gpioe, Output, PushPull};

use rathing::power::{PowerOutput, Supply};

use crate::hw::led::LedBar;
use crate::hw::pins::{LedPins, PowerPins};

type BarPins = LedBar<
    gpiod::PD8<Output<PushPull>>,
    gpiod::PD9<Output<PushPull>>,
    gpiod::PD10<Output<PushPull>>,
>;

/// Everything the power monitor reads or drives.
pub struct PowerIo {
    bar: BarPins,
    pins: PowerPins,
}

impl PowerIo {
    pub fn new(leds: LedPins, mut pins: PowerPins) -> Self {
        pins.converters_off.set_low();
        Self {
            bar: LedBar::new(leds.low, leds.medium, leds.high),
            pins,
        }
    }

    pub fn supply(&self) -> Supply {
        Supply {
            external: self.pins.usb_present.is_high(),
            charge_complete: self.pins.charge_done.is_high(),
        }
    }

    pub fn apply(&mut self, output: PowerOutput) {
        self.bar.show(output.leds);
        if output.converters_enabled {
            self.pins.converters_off.set_low();
        } else {
            self.pins.converters_off.set_high();
        }
    }
}

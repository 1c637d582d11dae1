// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Battery supervision.
//!
//! Once per second the battery level is shown on a three-LED bar. Below the lowest threshold the
//! boost converters feeding the servos are switched off and the bar blinks. On external power the
//! converters stay off, and the bar blinks while the charger is still working.

use crate::config::battery::{HIGH, LOW, MEDIUM};

/// All three LEDs of the bar.
pub const LEDS_ALL: u8 = 0b111;

/// State of the charger inputs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Supply {
    /// USB power is present.
    pub external: bool,
    /// The charger reports a full battery.
    pub charge_complete: bool,
}

/// What the board outputs should be set to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PowerOutput {
    /// LED bar, bit `n` lights LED `n`.
    pub leds: u8,
    pub converters_enabled: bool,
}

pub struct PowerMonitor {
    /// Control periods per update.
    period: u16,
    ticks: u16,
    leds: u8,
    charge_blink: bool,
}

impl PowerMonitor {
    /// Update every `period` calls to [`PowerMonitor::tick`].
    pub const fn new(period: u16) -> Self {
        Self {
            period: if period == 0 { 1 } else { period },
            ticks: 0,
            leds: 0,
            charge_blink: false,
        }
    }

    /// Count one control period. Returns new outputs once per update period.
    pub fn tick(&mut self, battery: u8, supply: Supply) -> Option<PowerOutput> {
        self.ticks += 1;
        if self.ticks < self.period {
            return None;
        }
        self.ticks = 0;
        Some(self.update(battery, supply))
    }

    pub fn update(&mut self, battery: u8, supply: Supply) -> PowerOutput {
        let mut converters_enabled = true;

        self.leds = if battery >= HIGH {
            LEDS_ALL
        } else if battery >= MEDIUM {
            0b011
        } else if battery >= LOW {
            0b001
        } else {
            converters_enabled = false;
            if self.leds == 0 {
                LEDS_ALL
            } else {
                0
            }
        };

        if supply.external {
            converters_enabled = false;
            if !supply.charge_complete && !self.charge_blink {
                self.leds = 0;
                self.charge_blink = true;
            } else {
                self.charge_blink = false;
            }
        }

        PowerOutput {
            leds: self.leds,
            converters_enabled,
        }
    }
}

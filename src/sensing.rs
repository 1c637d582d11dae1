// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Analog feedback from the servos and the battery.
//!
//! The ADC converts eleven inputs in round robin. For servo `i`, slot `2i` holds the current
//! sense and slot `2i + 1` the position potentiometer; the last slot holds the battery voltage.
//! Raw 12-bit results are stored in atomics so the control loop, the power monitor and the
//! command dispatcher can read them without masking the ADC interrupt.

use core::sync::atomic::{AtomicU16, Ordering};

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::ACTUATOR_COUNT;
use crate::control::servo::Reading;

/// Conversions per scan.
pub const SLOT_COUNT: usize = 2 * ACTUATOR_COUNT + 1;
pub const BATTERY_SLOT: usize = 2 * ACTUATOR_COUNT;

/// Current sense gain, mA per count.
const CURRENT_MA_PER_COUNT: f32 = 0.5;
/// Zero offset of the current sense amplifier, mA.
const CURRENT_OFFSET_MA: u8 = 1;
/// Potentiometer gain, degrees per count.
const ANGLE_DEG_PER_COUNT: f32 = 45.0 / 1024.0;
/// Potentiometer reading at the mechanical zero, degrees.
const ANGLE_OFFSET_DEG: u8 = 32;

#[inline]
pub const fn current_slot(servo: usize) -> usize {
    2 * servo
}

#[inline]
pub const fn angle_slot(servo: usize) -> usize {
    2 * servo + 1
}

/// Servo current in mA, saturating at 255.
pub fn current_ma(raw: u16) -> u8 {
    let ma = (f32::from(raw) * CURRENT_MA_PER_COUNT).round();
    (ma.min(255.0) as u8).saturating_sub(CURRENT_OFFSET_MA)
}

/// Servo angle in degrees.
pub fn angle_deg(raw: u16) -> u8 {
    let deg = (f32::from(raw) * ANGLE_DEG_PER_COUNT).round();
    (deg.min(255.0) as u8).saturating_sub(ANGLE_OFFSET_DEG)
}

/// Battery voltage as the top 8 bits of the 12-bit conversion.
#[inline]
pub fn battery_level(raw: u16) -> u8 {
    (raw.min(0x0FFF) >> 4) as u8
}

/// Source of scaled measurements.
pub trait Telemetry {
    /// Current drawn by `servo` in mA. 0 for an unknown servo.
    fn servo_current(&self, servo: usize) -> u8;

    /// Measured angle of `servo` in degrees. 0 for an unknown servo.
    fn servo_angle(&self, servo: usize) -> u8;

    fn battery(&self) -> u8;

    /// Angle and current of every servo, in servo order.
    fn servo_readings(&self) -> [Reading; ACTUATOR_COUNT] {
        core::array::from_fn(|i| Reading {
            angle_deg: self.servo_angle(i),
            current_ma: self.servo_current(i),
        })
    }
}

/// Latest raw conversion of every slot.
pub struct Readings {
    slots: [AtomicU16; SLOT_COUNT],
}

impl Default for Readings {
    fn default() -> Self {
        Self::new()
    }
}

impl Readings {
    pub const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const ZERO: AtomicU16 = AtomicU16::new(0);
        Self {
            slots: [ZERO; SLOT_COUNT],
        }
    }

    /// Out-of-range slots are ignored.
    #[inline]
    pub fn store(&self, slot: usize, raw: u16) {
        if let Some(s) = self.slots.get(slot) {
            s.store(raw, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn raw(&self, slot: usize) -> u16 {
        self.slots
            .get(slot)
            .map_or(0, |s| s.load(Ordering::Relaxed))
    }
}

impl Telemetry for Readings {
    fn servo_current(&self, servo: usize) -> u8 {
        if servo >= ACTUATOR_COUNT {
            return 0;
        }
        current_ma(self.raw(current_slot(servo)))
    }

    fn servo_angle(&self, servo: usize) -> u8 {
        if servo >= ACTUATOR_COUNT {
            return 0;
        }
        angle_deg(self.raw(angle_slot(servo)))
    }

    fn battery(&self) -> u8 {
        battery_level(self.raw(BATTERY_SLOT))
    }
}

/// Round-robin walk over the ADC input channels, one slot per conversion.
pub struct AnalogScanner {
    slot: usize,
    /// ADC input channel of every slot.
    channels: [u8; SLOT_COUNT],
}

impl AnalogScanner {
    pub const fn new(channels: [u8; SLOT_COUNT]) -> Self {
        Self { slot: 0, channels }
    }

    /// Input channel of the conversion in progress.
    #[inline]
    pub fn channel(&self) -> u8 {
        self.channels[self.slot]
    }

    /// Record the result of the conversion in progress and return the next channel to convert.
    pub fn complete(&mut self, raw: u16, readings: &Readings) -> u8 {
        readings.store(self.slot, raw);
        self.slot = (self.slot + 1) % SLOT_COUNT;
        self.channels[self.slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling() {
        assert_eq!(current_ma(0), 0);
        assert_eq!(current_ma(200), 99);
        assert_eq!(current_ma(4095), 254);

        assert_eq!(angle_deg(0), 0);
        assert_eq!(angle_deg(2048), 58);
        assert_eq!(angle_deg(4095), 148);

        assert_eq!(battery_level(0), 0);
        assert_eq!(battery_level(0x0DC0), 220);
        assert_eq!(battery_level(0xFFFF), 255);
    }

    #[test]
    fn slots_per_servo() {
        let readings = Readings::new();
        readings.store(current_slot(2), 300);
        readings.store(angle_slot(2), 4095);
        readings.store(BATTERY_SLOT, 0x0C00);

        assert_eq!(readings.servo_current(2), 149);
        assert_eq!(readings.servo_angle(2), 148);
        assert_eq!(readings.battery(), 0xC0);
        assert_eq!(readings.servo_current(1), 0);

        assert_eq!(
            readings.servo_readings()[2],
            Reading {
                angle_deg: 148,
                current_ma: 149
            }
        );
    }

    #[test]
    fn unknown_servo_reads_zero() {
        let readings = Readings::new();
        readings.store(BATTERY_SLOT, 0x0FFF);
        assert_eq!(readings.servo_current(ACTUATOR_COUNT), 0);
        assert_eq!(readings.servo_angle(ACTUATOR_COUNT), 0);
        assert_eq!(readings.raw(SLOT_COUNT), 0);
    }

    #[test]
    fn scanner_walks_all_slots_and_wraps() {
        let channels = [0, 1, 4, 5, 7, 8, 9, 10, 11, 12, 13];
        let mut scanner = AnalogScanner::new(channels);
        let readings = Readings::new();
        assert_eq!(scanner.channel(), 0);

        for (slot, &expected_next) in channels.iter().skip(1).enumerate() {
            assert_eq!(scanner.complete(slot as u16 + 100, &readings), expected_next);
        }
        assert_eq!(scanner.complete(999, &readings), 0);

        assert_eq!(readings.raw(0), 100);
        assert_eq!(readings.raw(9), 109);
        assert_eq!(readings.raw(BATTERY_SLOT), 999);
    }
}

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Finger servo control loop.
//!
//! One [`ServoBank`] drives all five finger servos. [`ServoBank::step`] runs once per PWM period
//! (50 Hz) with fresh angle and current readings and returns the pulse width for every channel.
//!
//! Pulse widths are tracked internally multiplied by [`SPEED_DIVIDER`] so that a speed of 1 moves
//! the output by a fraction of a microsecond per period.

use crate::config::servo::{
    DEFAULT_CURRENT_MA, MAX_ANGLE_DEG, PULSE_MAX_US, PULSE_MIN_US, SPEED_DIVIDER,
};
use crate::config::ACTUATOR_COUNT;
use crate::protocol::command::{CommandError, MODE_ANGLE, MODE_FOLLOW, MODE_HOLD};

/// Current below which a relaxed servo is considered unloaded, in mA.
const FOLLOW_IDLE_CURRENT_MA: u8 = 5;
/// Current above which a servo is considered moving, in mA.
const MOVING_CURRENT_MA: u8 = 10;
/// Step taken back when holding against too much current.
const HOLD_BACKOFF: u16 = 10;

/// Lowest stored control value.
const CONTROL_MIN: u16 = PULSE_MIN_US * SPEED_DIVIDER;

/// Operating mode, shared by all fingers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Move toward the target angle at the configured speed. Cut the pulse above the current
    /// limit.
    Angle,
    /// Close slowly on the target and keep a grip, opening a little whenever the current limit
    /// is crossed.
    Hold,
    /// Let the operator move the fingers; the servos track wherever they are put.
    Follow,
}

impl TryFrom<u8> for Mode {
    type Error = CommandError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            MODE_FOLLOW => Ok(Mode::Follow),
            MODE_ANGLE => Ok(Mode::Angle),
            MODE_HOLD => Ok(Mode::Hold),
            other => Err(CommandError::UnknownMode(other)),
        }
    }
}

/// Angle and current of one servo, as measured.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Reading {
    pub angle_deg: u8,
    pub current_ma: u8,
}

/// Pulse width for `angle` degrees, in microseconds.
pub fn angle_to_pulse(angle: u8) -> u16 {
    let angle = u32::from(angle.min(MAX_ANGLE_DEG));
    let span = u32::from(PULSE_MAX_US - PULSE_MIN_US);
    PULSE_MIN_US + (angle * span / u32::from(MAX_ANGLE_DEG)) as u16
}

/// Angle commanded by a pulse width in microseconds, rounded to the nearest degree.
pub fn pulse_to_angle(pulse: u16) -> u8 {
    let above_min = u32::from(pulse.clamp(PULSE_MIN_US, PULSE_MAX_US) - PULSE_MIN_US);
    let span = u32::from(PULSE_MAX_US - PULSE_MIN_US);
    ((above_min * u32::from(MAX_ANGLE_DEG) + span / 2) / span) as u8
}

#[derive(Copy, Clone, Debug)]
struct Channel {
    /// Pulse width times [`SPEED_DIVIDER`]. Never below [`CONTROL_MIN`].
    control: u16,
    current_limit_ma: u8,
    target_deg: u8,
    speed: u8,
    /// The last output pulse was off.
    relaxed: bool,
}

impl Channel {
    const DEFAULT: Self = Self {
        control: CONTROL_MIN,
        current_limit_ma: DEFAULT_CURRENT_MA,
        target_deg: 0,
        speed: 1,
        relaxed: false,
    };

    fn step(&mut self, mode: Mode, reading: Reading) -> u16 {
        let target = angle_to_pulse(self.target_deg) * SPEED_DIVIDER;
        let below_limit = reading.current_ma < self.current_limit_ma;

        let next = match mode {
            Mode::Angle if below_limit => {
                let speed = u16::from(self.speed);
                if self.control < target {
                    self.control.saturating_add(speed).min(target)
                } else {
                    self.control.saturating_sub(speed).max(target)
                }
            }
            Mode::Angle => 0,
            Mode::Hold if below_limit => (self.control + 1).min(target),
            Mode::Hold => self.control.saturating_sub(HOLD_BACKOFF).max(CONTROL_MIN),
            Mode::Follow => {
                if self.relaxed && reading.current_ma < FOLLOW_IDLE_CURRENT_MA {
                    angle_to_pulse(reading.angle_deg) * SPEED_DIVIDER
                } else {
                    0
                }
            }
        };

        if next >= CONTROL_MIN {
            self.control = next;
        }
        self.relaxed = next == 0;
        next / SPEED_DIVIDER
    }
}

pub struct ServoBank {
    mode: Mode,
    channels: [Channel; ACTUATOR_COUNT],
}

impl Default for ServoBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoBank {
    /// All fingers at 0°, default current limit, speed 1, following the operator.
    pub const fn new() -> Self {
        Self {
            mode: Mode::Follow,
            channels: [Channel::DEFAULT; ACTUATOR_COUNT],
        }
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Target angle, clamped to `1..=180`. Out-of-range servos are ignored.
    pub fn set_angle(&mut self, servo: usize, angle_deg: u8) {
        if let Some(ch) = self.channels.get_mut(servo) {
            ch.target_deg = angle_deg.clamp(1, MAX_ANGLE_DEG);
        }
    }

    /// Current limit in mA. Out-of-range servos are ignored.
    pub fn set_current(&mut self, servo: usize, limit_ma: u8) {
        if let Some(ch) = self.channels.get_mut(servo) {
            ch.current_limit_ma = limit_ma;
        }
    }

    /// Control step per period in [`Mode::Angle`]. Out-of-range servos are ignored.
    pub fn set_speed(&mut self, servo: usize, speed: u8) {
        if let Some(ch) = self.channels.get_mut(servo) {
            ch.speed = speed;
        }
    }

    /// Angle the servo is currently commanded to.
    pub fn angle(&self, servo: usize) -> Option<u8> {
        self.channels
            .get(servo)
            .map(|ch| pulse_to_angle(ch.control / SPEED_DIVIDER))
    }

    /// Configured speed while the servo is visibly moving, otherwise 0.
    pub fn speed(&self, servo: usize, current_ma: u8) -> Option<u8> {
        self.channels.get(servo).map(|ch| {
            if current_ma > MOVING_CURRENT_MA && current_ma < ch.current_limit_ma {
                ch.speed
            } else {
                0
            }
        })
    }

    /// Run one control period. Returns the pulse width per servo in microseconds; 0 means no
    /// pulse.
    pub fn step(&mut self, readings: &[Reading; ACTUATOR_COUNT]) -> [u16; ACTUATOR_COUNT] {
        let mode = self.mode;
        let mut pulses = [0; ACTUATOR_COUNT];
        for ((pulse, ch), reading) in pulses.iter_mut().zip(&mut self.channels).zip(readings) {
            *pulse = ch.step(mode, *reading);
        }
        pulses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(current_ma: u8) -> [Reading; ACTUATOR_COUNT] {
        [Reading {
            angle_deg: 0,
            current_ma,
        }; ACTUATOR_COUNT]
    }

    #[test]
    fn pulse_angle_conversions() {
        assert_eq!(angle_to_pulse(0), 500);
        assert_eq!(angle_to_pulse(90), 1500);
        assert_eq!(angle_to_pulse(180), 2500);
        assert_eq!(angle_to_pulse(255), 2500);
        assert_eq!(pulse_to_angle(500), 0);
        assert_eq!(pulse_to_angle(1500), 90);
        assert_eq!(pulse_to_angle(2500), 180);
        assert_eq!(pulse_to_angle(0), 0);
    }

    #[test]
    fn mode_from_data_byte() {
        assert_eq!(Mode::try_from(MODE_FOLLOW), Ok(Mode::Follow));
        assert_eq!(Mode::try_from(MODE_ANGLE), Ok(Mode::Angle));
        assert_eq!(Mode::try_from(MODE_HOLD), Ok(Mode::Hold));
        assert_eq!(Mode::try_from(9), Err(CommandError::UnknownMode(9)));
    }

    #[test]
    fn starts_following() {
        let bank = ServoBank::new();
        assert_eq!(bank.mode(), Mode::Follow);
        assert_eq!(bank.angle(0), Some(0));
    }

    #[test]
    fn angle_mode_ramps_at_speed_and_stops_on_target() {
        let mut bank = ServoBank::new();
        bank.set_mode(Mode::Angle);
        bank.set_angle(1, 1);
        bank.set_speed(1, 9);

        // Target control: (500 + 11) * 2 = 1022, start 1000.
        let pulses = bank.step(&at(0));
        assert_eq!(pulses[1], 504);
        let pulses = bank.step(&at(0));
        assert_eq!(pulses[1], 509);
        let pulses = bank.step(&at(0));
        assert_eq!(pulses[1], 511);
        let pulses = bank.step(&at(0));
        assert_eq!(pulses[1], 511);
        assert_eq!(bank.angle(1), Some(1));
    }

    #[test]
    fn angle_mode_cuts_pulse_over_current_limit() {
        let mut bank = ServoBank::new();
        bank.set_mode(Mode::Angle);
        bank.set_angle(0, 90);
        bank.set_speed(0, 100);
        bank.step(&at(0));
        let before = bank.angle(0);

        bank.set_current(0, 50);
        let pulses = bank.step(&at(50));
        assert_eq!(pulses[0], 0);
        // The stored control is kept.
        assert_eq!(bank.angle(0), before);
    }

    #[test]
    fn hold_creeps_then_backs_off() {
        let mut bank = ServoBank::new();
        bank.set_mode(Mode::Hold);
        bank.set_angle(2, 90);

        assert_eq!(bank.step(&at(0))[2], 500);
        bank.step(&at(0));
        // Control is 1003 after three periods.
        assert_eq!(bank.step(&at(0))[2], 501);

        bank.set_current(2, 100);
        // Backing off never goes below the minimum pulse.
        assert_eq!(bank.step(&at(200))[2], 500);
    }

    #[test]
    fn follow_alternates_relaxed_and_tracking_periods() {
        let mut bank = ServoBank::new();
        let readings = [Reading {
            angle_deg: 90,
            current_ma: 0,
        }; ACTUATOR_COUNT];

        assert_eq!(bank.step(&readings), [0; ACTUATOR_COUNT]);
        assert_eq!(bank.step(&readings), [1500; ACTUATOR_COUNT]);
        assert_eq!(bank.step(&readings), [0; ACTUATOR_COUNT]);
        assert_eq!(bank.angle(4), Some(90));

        let loaded = [Reading {
            angle_deg: 90,
            current_ma: 5,
        }; ACTUATOR_COUNT];
        assert_eq!(bank.step(&loaded), [0; ACTUATOR_COUNT]);
    }

    #[test]
    fn setters_clamp_and_ignore_bad_indices() {
        let mut bank = ServoBank::new();
        bank.set_angle(0, 0);
        bank.set_angle(1, 250);
        bank.set_angle(ACTUATOR_COUNT, 90);
        bank.set_current(ACTUATOR_COUNT, 1);
        bank.set_speed(ACTUATOR_COUNT, 1);
        assert_eq!(bank.channels[0].target_deg, 1);
        assert_eq!(bank.channels[1].target_deg, 180);
        assert_eq!(bank.angle(ACTUATOR_COUNT), None);
        assert_eq!(bank.speed(ACTUATOR_COUNT, 50), None);
    }

    #[test]
    fn speed_reported_only_while_moving() {
        let mut bank = ServoBank::new();
        bank.set_speed(3, 7);
        assert_eq!(bank.speed(3, 10), Some(0));
        assert_eq!(bank.speed(3, 11), Some(7));
        assert_eq!(bank.speed(3, DEFAULT_CURRENT_MA), Some(0));
    }
}

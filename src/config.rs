// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Compile-time configuration for the RA Thing firmware.
//!
//! Nothing here is read at runtime from the environment or from flash. Change a value, rebuild,
//! reflash.

/// Capacity of the inbound and outbound command queues.
pub const QUEUE_CAPACITY: usize = 8;

/// Number of actuators (one servo per finger).
pub const ACTUATOR_COUNT: usize = 5;

/// Largest payload accepted in a single `+IPD` frame, in bytes (4 commands).
pub const MAX_FRAME_PAYLOAD: u8 = 8;

/// Line speed of the modem link.
pub const LINK_BAUD: u32 = 115_200;

/// Line speed of the debug serial line.
pub const DEBUG_BAUD: u32 = 115_200;

/// Access-point authentication modes understood by `AT+CWSAP`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ApAuth {
    Open = 0,
    WpaPsk = 2,
    Wpa2Psk = 3,
    WpaWpa2Psk = 4,
}

/// Settings pushed to the wireless modem during initialization.
#[derive(Copy, Clone, Debug)]
pub struct ModemConfig {
    /// Name of the access point the modem opens.
    pub ssid: &'static str,
    /// Empty for an open network.
    pub password: &'static str,
    /// WiFi radio channel.
    pub radio_channel: u8,
    pub auth: ApAuth,
    /// Idle timeout before the modem drops a client, in seconds.
    pub client_timeout_s: u16,
    /// TCP port of the listening server.
    pub server_port: u16,
    /// Link channel (connection id) used for telemetry replies.
    pub reply_channel: u8,
    /// Sent to every client right after it connects.
    pub greeting: &'static str,
    /// Time given to the modem to boot before the first directive.
    pub startup_delay_ms: u32,
    /// Pause after each directive.
    pub directive_delay_ms: u32,
}

impl ModemConfig {
    pub const DEFAULT: Self = Self {
        ssid: "Thing",
        password: "",
        radio_channel: 5,
        auth: ApAuth::Open,
        client_timeout_s: 60,
        server_port: 333,
        reply_channel: 0,
        greeting: "RA Thing v0.1\r\n",
        startup_delay_ms: 1000,
        directive_delay_ms: 10,
    };
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Servo output limits and control loop tuning.
pub mod servo {
    /// Shortest valid control pulse, in microseconds (0°).
    pub const PULSE_MIN_US: u16 = 500;
    /// Longest valid control pulse, in microseconds (180°).
    pub const PULSE_MAX_US: u16 = 2500;
    /// PWM period in microseconds (50 Hz).
    pub const PERIOD_US: u16 = 20_000;
    /// The control value is kept at this multiple of the pulse width, giving fractional speeds.
    pub const SPEED_DIVIDER: u16 = 2;
    /// Current limit applied at boot, in mA.
    pub const DEFAULT_CURRENT_MA: u8 = 250;
    /// Largest commandable angle, in degrees.
    pub const MAX_ANGLE_DEG: u8 = 180;
}

/// Battery thresholds on the 8-bit battery reading.
pub mod battery {
    pub const HIGH: u8 = 220;
    pub const MEDIUM: u8 = 190;
    pub const LOW: u8 = 161;
}

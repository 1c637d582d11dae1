// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-width commands exchanged with the remote controller.
//!
//! A command is 16 bits: a 4-bit operation code, a 4-bit actuator index and an 8-bit data byte.
//! The opcode occupies the low nibble of the header byte and the actuator index the high nibble.
//!
//! The two directions of the link use mirrored byte orders:
//!
//! | Direction | Byte 0 | Byte 1 |
//! | --------- | ------ | ------ |
//! | Receive   | header | data   |
//! | Transmit  | data   | header |
//!
//! The remote peer writes in one order and reads in the other, so both must be kept as-is.

use thiserror::Error;

use crate::config::ACTUATOR_COUNT;

// Operation codes
pub const OP_SET_MODE: u8 = 0x01;
pub const OP_SET_ANGLE: u8 = 0x02;
pub const OP_SET_CURRENT: u8 = 0x03;
pub const OP_SET_SPEED: u8 = 0x04;
pub const OP_GET_ANGLE: u8 = 0x05;
pub const OP_GET_CURRENT: u8 = 0x06;
pub const OP_GET_SPEED: u8 = 0x07;

// Data values of a set-mode command
pub const MODE_FOLLOW: u8 = 0x00;
pub const MODE_ANGLE: u8 = 0x01;
pub const MODE_HOLD: u8 = 0x02;

/// Errors raised when interpreting the fields of a command.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown opcode {0:#x}")]
    UnknownOpcode(u8),
    #[error("actuator index {0} out of range")]
    TargetOutOfRange(u8),
    #[error("unknown servo mode {0:#x}")]
    UnknownMode(u8),
}

/// Operations the remote controller can request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opcode {
    SetMode,
    SetAngle,
    SetCurrent,
    SetSpeed,
    GetAngle,
    GetCurrent,
    GetSpeed,
}

impl Opcode {
    #[inline]
    pub fn bits(self) -> u8 {
        match self {
            Opcode::SetMode => OP_SET_MODE,
            Opcode::SetAngle => OP_SET_ANGLE,
            Opcode::SetCurrent => OP_SET_CURRENT,
            Opcode::SetSpeed => OP_SET_SPEED,
            Opcode::GetAngle => OP_GET_ANGLE,
            Opcode::GetCurrent => OP_GET_CURRENT,
            Opcode::GetSpeed => OP_GET_SPEED,
        }
    }

    /// Telemetry requests are answered with a command of the same opcode.
    #[inline]
    pub fn is_query(self) -> bool {
        matches!(self, Opcode::GetAngle | Opcode::GetCurrent | Opcode::GetSpeed)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = CommandError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            OP_SET_MODE => Ok(Opcode::SetMode),
            OP_SET_ANGLE => Ok(Opcode::SetAngle),
            OP_SET_CURRENT => Ok(Opcode::SetCurrent),
            OP_SET_SPEED => Ok(Opcode::SetSpeed),
            OP_GET_ANGLE => Ok(Opcode::GetAngle),
            OP_GET_CURRENT => Ok(Opcode::GetCurrent),
            OP_GET_SPEED => Ok(Opcode::GetSpeed),
            other => Err(CommandError::UnknownOpcode(other)),
        }
    }
}

/// A raw 16-bit command.
///
/// The transport layer never interprets the fields: anything that arrives in a well-formed frame
/// is queued. Use [`Command::opcode`] and [`Command::actuator`] to validate on the consumer side.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Command {
    raw: u16,
}

impl Command {
    /// Build a command from its fields. `target` is truncated to 4 bits.
    pub const fn new(op: u8, target: u8, data: u8) -> Self {
        let header = ((target & 0x0F) << 4) | (op & 0x0F);
        Self {
            raw: ((header as u16) << 8) | data as u16,
        }
    }

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    /// Raw value: header in the high byte, data in the low byte.
    #[inline]
    pub const fn raw(&self) -> u16 {
        self.raw
    }

    /// Decode the two bytes of a command as they arrive from the link.
    #[inline]
    pub const fn from_rx_bytes(first: u8, second: u8) -> Self {
        Self {
            raw: ((first as u16) << 8) | second as u16,
        }
    }

    /// The two bytes of this command in the order they must be transmitted.
    #[inline]
    pub const fn to_tx_bytes(&self) -> [u8; 2] {
        [self.data(), self.header()]
    }

    /// Packed opcode and actuator index.
    #[inline]
    pub const fn header(&self) -> u8 {
        (self.raw >> 8) as u8
    }

    #[inline]
    pub const fn opcode_bits(&self) -> u8 {
        self.header() & 0x0F
    }

    #[inline]
    pub const fn target(&self) -> u8 {
        self.header() >> 4
    }

    #[inline]
    pub const fn data(&self) -> u8 {
        self.raw as u8
    }

    pub fn opcode(&self) -> Result<Opcode, CommandError> {
        Opcode::try_from(self.opcode_bits())
    }

    /// Index of the addressed actuator, validated against [`ACTUATOR_COUNT`].
    pub fn actuator(&self) -> Result<usize, CommandError> {
        let target = self.target();
        if (target as usize) < ACTUATOR_COUNT {
            Ok(target as usize)
        } else {
            Err(CommandError::TargetOutOfRange(target))
        }
    }

    /// Same opcode and target, new payload. Used to answer telemetry requests.
    #[inline]
    pub const fn with_data(&self, data: u8) -> Self {
        Self {
            raw: (self.raw & 0xFF00) | data as u16,
        }
    }
}

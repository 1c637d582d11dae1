// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Applies received commands to the servo bank.

use crate::control::servo::{Mode, ServoBank};
use crate::protocol::{Command, CommandError, Opcode};
use crate::sensing::Telemetry;

/// Execute `cmd`. Queries return the reply to send back: the request with its data byte
/// replaced by the answer.
pub fn dispatch<T: Telemetry + ?Sized>(
    cmd: Command,
    servos: &mut ServoBank,
    telemetry: &T,
) -> Result<Option<Command>, CommandError> {
    let op = cmd.opcode()?;
    if op == Opcode::SetMode {
        servos.set_mode(Mode::try_from(cmd.data())?);
        return Ok(None);
    }

    let servo = cmd.actuator()?;
    let reply = match op {
        Opcode::SetMode => None,
        Opcode::SetAngle => {
            servos.set_angle(servo, cmd.data());
            None
        }
        Opcode::SetCurrent => {
            servos.set_current(servo, cmd.data());
            None
        }
        Opcode::SetSpeed => {
            servos.set_speed(servo, cmd.data());
            None
        }
        Opcode::GetAngle => Some(telemetry.servo_angle(servo)),
        Opcode::GetCurrent => Some(telemetry.servo_current(servo)),
        Opcode::GetSpeed => servos.speed(servo, telemetry.servo_current(servo)),
    };
    Ok(reply.map(|data| cmd.with_data(data)))
}

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Wire protocol spoken with the wireless modem and, through it, with the remote controller.

pub mod at;
pub mod command;
pub mod parser;

pub use command::{Command, CommandError, Opcode};
pub use parser::{Event, FrameParser};

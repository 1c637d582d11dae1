// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Servo control loop and command execution.

pub mod dispatch;
pub mod servo;

pub use dispatch::dispatch;
pub use servo::{Mode, Reading, ServoBank};

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # RA Thing Firmware
//!
//! Hardware-independent core of the RA Thing robotic hand firmware: the command transport over
//! an ESP8266 WiFi modem, the finger servo control loop and battery supervision. The board
//! support lives in the `firmware/` package, which builds this crate for an STM32F777 MCU.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`transport`] | Interrupt-driven command queues, transmit sequencer and the [`Modem`](transport::Modem) façade |
//! | [`protocol`]  | Command codec, modem frame parser and AT directives |
//! | [`control`]   | Servo control loop and command dispatch |
//! | [`sensing`]   | ADC scan slots and measurement scaling |
//! | [`power`]     | Battery level display and converter cut-off |
//! | [`config`]    | Compile-time settings |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cd firmware && cargo run --release
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod control;
pub mod power;
pub mod protocol;
pub mod sensing;
pub mod transport;

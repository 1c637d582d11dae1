// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod adc;
pub mod irq;
pub mod led;
pub mod modem;
pub mod pins;
pub mod power;
pub mod pwm;
pub mod usart;

pub use irq::NvicGate;
pub use modem::ModemUsart;
pub use pins::BoardPins;
pub use power::PowerIo;
pub use usart::DebugLog;

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command transport over the ESP8266 serial link.
//!
//! The link interrupt drives [`Transport`]: received bytes go through the frame parser into the
//! inbound queue, and transmit-ready events pull bytes out of the outbound queue through the
//! sequencer. The main loop only ever sees the [`Modem`] façade.

pub mod link;
pub mod modem;
pub mod queue;
pub mod sequencer;
pub mod shared;

pub use link::{BlockingWriter, ModemLink, Transport};
pub use modem::Modem;
pub use queue::{CommandQueue, Ring};
pub use sequencer::{TxAction, TxState};
pub use shared::{IrqCell, IrqGate};

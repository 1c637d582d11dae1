// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte parser for the modem's receive stream.
//!
//! The modem mixes textual status lines with framed binary data. The parser recognizes:
//!
//! - data frames: `+IPD,<channel>,<length>:<payload>`, where `<length>` is a single digit and the
//!   payload is a sequence of 2-byte commands in receive ordering,
//! - the device-ready prompt `>` that the modem prints once it accepts raw bytes after
//!   `AT+CIPSEND`,
//! - connection notices `<channel>,CONNECT`.
//!
//! Everything else (echoes, `OK`, `WIFI CONNECTED`, ...) is ignored.
//!
//! Bytes are fed one at a time from the receive interrupt, so all progress lives in the parser.
//!
//! The `>` prompt is reported in every state and never counts as frame content. A `+` seen
//! anywhere inside a frame, payload included, drops the partial frame and starts a new one.
//! Command bytes equal to either marker therefore cannot be carried.

use log::{debug, warn};

use crate::config::MAX_FRAME_PAYLOAD;
use crate::protocol::command::Command;

/// Starts a data frame.
pub const FRAME_START: u8 = b'+';
/// Device-ready prompt.
pub const DEVICE_READY: u8 = b'>';
/// Separates the frame header from the payload.
pub const FRAME_DELIMITER: u8 = b':';
/// Characters between the frame start and the length digit: `IPD,<channel>,`.
pub const HEADER_SKIP: u8 = 6;

/// Tail of a connection notice, after the channel digit.
const CONNECT_SUFFIX: &[u8] = b",CONNECT";

/// Something the parser recognized.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A complete command was decoded from a data frame.
    Command(Command),
    /// The modem is ready to accept the payload of a pending send.
    DeviceReady,
    /// A client connected on the given link channel.
    Connected(u8),
}

/// Position within the receive stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    SkippingToLength,
    ComputingLength,
    SkippingToData,
    FetchingHighByte,
    FetchingLowByte { high: u8 },
}

/// Receive-side state machine; see the module docs for the recognized input.
pub struct FrameParser {
    state: State,
    /// Header characters still to skip.
    skip: u8,
    /// Payload bytes still to fetch.
    remaining: u8,
    /// Progress through `<digit>,CONNECT` while idle.
    connect_matched: u8,
    connect_channel: u8,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            skip: 0,
            remaining: 0,
            connect_matched: 0,
            connect_channel: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Process a single incoming byte. Returns an [`Event`] when one is complete.
    pub fn feed(&mut self, byte: u8) -> Option<Event> {
        match self.state {
            _ if byte == DEVICE_READY => Some(Event::DeviceReady),
            State::Idle if byte == FRAME_START => {
                self.start_frame();
                None
            }
            State::Idle => self.match_connect(byte).map(Event::Connected),
            _ if byte == FRAME_START => {
                warn!("esp: frame restarted from {:?}", self.state);
                self.start_frame();
                None
            }
            State::FetchingHighByte => {
                self.state = State::FetchingLowByte { high: byte };
                None
            }
            State::FetchingLowByte { high } => {
                let cmd = Command::from_rx_bytes(high, byte);
                self.remaining -= 2;
                self.state = if self.remaining == 0 {
                    State::Idle
                } else {
                    State::FetchingHighByte
                };
                Some(Event::Command(cmd))
            }
            State::SkippingToLength => {
                self.skip -= 1;
                if self.skip == 0 {
                    self.state = State::ComputingLength;
                }
                None
            }
            State::ComputingLength => {
                if !byte.is_ascii_digit() {
                    warn!("esp: bad frame length {:#04x}", byte);
                    self.state = State::Idle;
                    return None;
                }

                let mut len = (byte - b'0').min(MAX_FRAME_PAYLOAD);
                if len % 2 != 0 {
                    warn!("esp: odd frame length {}, truncating", len);
                    len &= !1;
                }
                self.remaining = len;
                self.state = State::SkippingToData;
                None
            }
            State::SkippingToData => {
                self.state = if byte != FRAME_DELIMITER {
                    warn!("esp: missing frame delimiter, got {:#04x}", byte);
                    State::Idle
                } else if self.remaining == 0 {
                    State::Idle
                } else {
                    State::FetchingHighByte
                };
                None
            }
        }
    }

    fn start_frame(&mut self) {
        self.state = State::SkippingToLength;
        self.skip = HEADER_SKIP;
        self.remaining = 0;
        self.connect_matched = 0;
    }

    /// Track `<digit>,CONNECT`. Returns the channel once the notice is complete.
    fn match_connect(&mut self, byte: u8) -> Option<u8> {
        let matched = self.connect_matched as usize;

        if matched > 0 && byte == CONNECT_SUFFIX[matched - 1] {
            self.connect_matched += 1;
            if self.connect_matched as usize == CONNECT_SUFFIX.len() + 1 {
                self.connect_matched = 0;
                debug!("esp: client connected on channel {}", self.connect_channel);
                return Some(self.connect_channel);
            }
        } else if byte.is_ascii_digit() {
            self.connect_channel = byte - b'0';
            self.connect_matched = 1;
        } else {
            self.connect_matched = 0;
        }
        None
    }
}

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! AT directives understood by the ESP8266 modem firmware.

use core::fmt::{self, Write};

use heapless::String;
use log::warn;

use crate::config::ModemConfig;

/// Line terminator expected after every directive.
pub const CRLF: &str = "\r\n";

/// Longest formatted send prefix: `AT+CIPSEND=<ch>,<len>\r\n` with a 5-digit length.
pub const PREFIX_CAPACITY: usize = 24;

/// Most bytes the modem accepts after one `AT+CIPSEND`.
pub const MAX_SEND_LEN: u16 = 2048;

/// Send prefix for one outbound payload.
pub type SendPrefix = String<PREFIX_CAPACITY>;

/// One configuration directive of the initialization sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// `ATE0`: stop echoing what we send.
    EchoOff,
    /// `AT+CWMODE=2`: access-point mode.
    AccessPointMode,
    /// `AT+CWSAP=...`: access-point name, password, radio channel, authentication.
    AccessPoint,
    /// `AT+CIPMUX=1`: multiple connections, data frames carry a channel.
    MultiConnection,
    /// `AT+CIPSTO=<s>`: drop idle clients.
    ClientTimeout,
    /// `AT+CIPSERVER=1,<port>`: listen for clients.
    Server,
}

impl Directive {
    /// The initialization sequence, in the order it must be sent.
    pub const INIT_SEQUENCE: [Directive; 6] = [
        Directive::EchoOff,
        Directive::AccessPointMode,
        Directive::AccessPoint,
        Directive::MultiConnection,
        Directive::ClientTimeout,
        Directive::Server,
    ];

    /// Write the directive, including the line terminator.
    pub fn write_to<W: Write>(&self, out: &mut W, config: &ModemConfig) -> fmt::Result {
        match self {
            Directive::EchoOff => out.write_str("ATE0")?,
            Directive::AccessPointMode => out.write_str("AT+CWMODE=2")?,
            Directive::AccessPoint => write!(
                out,
                "AT+CWSAP=\"{}\",\"{}\",{},{}",
                config.ssid, config.password, config.radio_channel, config.auth as u8
            )?,
            Directive::MultiConnection => out.write_str("AT+CIPMUX=1")?,
            Directive::ClientTimeout => write!(out, "AT+CIPSTO={}", config.client_timeout_s)?,
            Directive::Server => write!(out, "AT+CIPSERVER=1,{}", config.server_port)?,
        }
        out.write_str(CRLF)
    }
}

/// Format `AT+CIPSEND=<channel>,<len>\r\n`.
pub fn send_prefix(channel: u8, len: u16) -> SendPrefix {
    let mut prefix = SendPrefix::new();
    if write!(prefix, "AT+CIPSEND={},{}{}", channel, len, CRLF).is_err() {
        warn!("esp: send prefix for {} bytes truncated", len);
    }
    prefix
}

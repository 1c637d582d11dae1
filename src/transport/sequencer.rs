// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Transmit side of the modem link.
//!
//! Every payload goes out through the same handshake:
//!
//! 1. `AT+CIPSEND=<channel>,<len>\r\n`, one character per transmit-ready event,
//! 2. wait until the modem prints its `>` prompt,
//! 3. the raw payload bytes, one per transmit-ready event.
//!
//! The head job stays queued until its last byte is written, then it is popped.

use embedded_hal::serial;

use crate::protocol::at::{send_prefix, SendPrefix, MAX_SEND_LEN};
use crate::protocol::Command;
use crate::transport::queue::CommandQueue;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TxState {
    Idle,
    EmittingPrefix,
    AwaitingDeviceReady,
    EmittingPayload,
}

/// A payload the sequencer can send.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Job {
    /// A command, sent on the reply channel in transmit ordering.
    Command(Command),
    /// The greeting text, sent to a client that just connected.
    Greeting { channel: u8 },
}

/// Result of one transmit-ready event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TxAction {
    /// One byte was written.
    Sent,
    /// The link refused the byte; try again on the next event.
    Blocked,
    /// Prefix done, the modem has not printed its prompt yet.
    AwaitingDevice,
    /// Nothing left to send.
    Idle,
}

/// Everything waiting to be transmitted.
pub struct Outbox<const N: usize> {
    commands: CommandQueue<N>,
    /// Channel of a client still owed a greeting.
    greeting: Option<u8>,
}

impl<const N: usize> Default for Outbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Outbox<N> {
    pub const fn new() -> Self {
        Self {
            commands: CommandQueue::new(Command::from_raw(0)),
            greeting: None,
        }
    }

    /// Queue a command. A full outbox hands the command back.
    #[inline]
    pub fn push(&mut self, cmd: Command) -> Result<(), Command> {
        self.commands.try_push(cmd)
    }

    /// Owe a greeting to `channel`. Only the latest request is kept.
    #[inline]
    pub fn request_greeting(&mut self, channel: u8) {
        self.greeting = Some(channel);
    }

    /// Queued commands, including one currently being sent.
    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.commands.is_full()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.greeting.is_none()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.greeting = None;
    }

    /// Greetings go before commands.
    fn next_job(&self) -> Option<Job> {
        match self.greeting {
            Some(channel) => Some(Job::Greeting { channel }),
            None => self.commands.peek().map(Job::Command),
        }
    }

    fn finish(&mut self, job: Job) {
        match job {
            Job::Command(_) => {
                self.commands.pop();
            }
            Job::Greeting { channel } => {
                if self.greeting == Some(channel) {
                    self.greeting = None;
                }
            }
        }
    }
}

pub struct Sequencer {
    state: TxState,
    /// Next byte of the prefix or payload.
    offset: usize,
    device_ready: bool,
    job: Option<Job>,
    prefix: SendPrefix,
    reply_channel: u8,
    greeting: &'static str,
}

impl Sequencer {
    /// Panics if `greeting` does not fit in one send. Evaluated at compile time when the
    /// sequencer initializes a `static`.
    pub const fn new(reply_channel: u8, greeting: &'static str) -> Self {
        assert!(
            greeting.len() <= MAX_SEND_LEN as usize,
            "greeting longer than one send"
        );
        Self {
            state: TxState::Idle,
            offset: 0,
            device_ready: false,
            job: None,
            prefix: SendPrefix::new(),
            reply_channel,
            greeting,
        }
    }

    #[inline]
    pub fn state(&self) -> TxState {
        self.state
    }

    #[inline]
    pub fn device_ready(&self) -> bool {
        self.device_ready
    }

    /// The modem printed its prompt.
    #[inline]
    pub fn set_device_ready(&mut self) {
        self.device_ready = true;
    }

    #[inline]
    pub fn greeting(&self) -> &'static str {
        self.greeting
    }

    /// Abandon the job in flight.
    pub fn reset(&mut self) {
        self.state = TxState::Idle;
        self.offset = 0;
        self.device_ready = false;
        self.job = None;
        self.prefix.clear();
    }

    /// Handle one transmit-ready event: write at most one byte to `link`.
    pub fn step<W, const N: usize>(&mut self, outbox: &mut Outbox<N>, link: &mut W) -> TxAction
    where
        W: serial::Write<u8>,
    {
        match self.state {
            TxState::Idle => {
                let Some(job) = outbox.next_job() else {
                    return TxAction::Idle;
                };
                let (channel, len) = match job {
                    Job::Command(_) => (self.reply_channel, 2),
                    Job::Greeting { channel } => (channel, self.greeting.len() as u16),
                };
                self.prefix = send_prefix(channel, len);
                self.job = Some(job);
                self.offset = 0;
                self.device_ready = false;
                self.state = TxState::EmittingPrefix;
                self.emit_prefix(link)
            }
            TxState::EmittingPrefix => self.emit_prefix(link),
            TxState::AwaitingDeviceReady => {
                if !self.device_ready {
                    return TxAction::AwaitingDevice;
                }
                self.state = TxState::EmittingPayload;
                self.emit_payload(outbox, link)
            }
            TxState::EmittingPayload => self.emit_payload(outbox, link),
        }
    }

    fn emit_prefix<W: serial::Write<u8>>(&mut self, link: &mut W) -> TxAction {
        let byte = self.prefix.as_bytes()[self.offset];
        if link.write(byte).is_err() {
            return TxAction::Blocked;
        }

        self.offset += 1;
        if self.offset == self.prefix.len() {
            self.offset = 0;
            self.state = TxState::AwaitingDeviceReady;
        }
        TxAction::Sent
    }

    fn emit_payload<W, const N: usize>(&mut self, outbox: &mut Outbox<N>, link: &mut W) -> TxAction
    where
        W: serial::Write<u8>,
    {
        let Some(job) = self.job else {
            self.reset();
            return TxAction::Idle;
        };

        let (byte, len) = match job {
            Job::Command(cmd) => (cmd.to_tx_bytes()[self.offset], 2),
            Job::Greeting { .. } => {
                let text = self.greeting.as_bytes();
                (text[self.offset], text.len())
            }
        };
        if link.write(byte).is_err() {
            return TxAction::Blocked;
        }

        self.offset += 1;
        if self.offset == len {
            outbox.finish(job);
            self.job = None;
            self.offset = 0;
            self.device_ready = false;
            self.state = TxState::Idle;
        }
        TxAction::Sent
    }
}

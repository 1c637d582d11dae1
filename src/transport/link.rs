// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interrupt-side half of the modem transport.
//!
//! [`Transport`] owns the serial link, the frame parser, both command queues and the transmit
//! sequencer. Its two event handlers are meant to be called from the link's interrupt handler:
//! [`Transport::feed`] for every received byte and [`Transport::on_tx_ready`] whenever the link
//! can take another byte.

use core::fmt;

use embedded_hal::serial;
use log::{debug, warn};

use crate::config::{ModemConfig, QUEUE_CAPACITY};
use crate::protocol::{Command, Event, FrameParser};
use crate::protocol::parser::State as RxState;
use crate::transport::queue::CommandQueue;
use crate::transport::sequencer::{Outbox, Sequencer, TxAction, TxState};

/// Serial link to the modem that can raise a transmit-ready interrupt.
pub trait ModemLink: serial::Write<u8> {
    /// Raise transmit-ready events until told otherwise.
    fn listen_tx_ready(&mut self);

    /// Stop raising transmit-ready events.
    fn unlisten_tx_ready(&mut self);
}

/// `fmt::Write` over a serial link, busy-waiting on every byte.
pub struct BlockingWriter<'a, W>(pub &'a mut W);

impl<W: serial::Write<u8>> fmt::Write for BlockingWriter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &b in s.as_bytes() {
            nb::block!(self.0.write(b)).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

pub struct Transport<L, const N: usize = QUEUE_CAPACITY> {
    link: L,
    parser: FrameParser,
    sequencer: Sequencer,
    inbound: CommandQueue<N>,
    outbox: Outbox<N>,
}

impl<L: ModemLink, const N: usize> Transport<L, N> {
    pub const fn new(link: L, config: &ModemConfig) -> Self {
        Self {
            link,
            parser: FrameParser::new(),
            sequencer: Sequencer::new(config.reply_channel, config.greeting),
            inbound: CommandQueue::new(Command::from_raw(0)),
            outbox: Outbox::new(),
        }
    }

    #[inline]
    pub fn link(&self) -> &L {
        &self.link
    }

    #[inline]
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Empty both queues and return parser and sequencer to idle.
    pub fn reset(&mut self) {
        self.link.unlisten_tx_ready();
        self.parser.reset();
        self.sequencer.reset();
        self.inbound.clear();
        self.outbox.clear();
    }

    /// Receive event: process one byte from the modem.
    pub fn feed(&mut self, byte: u8) {
        match self.parser.feed(byte) {
            Some(Event::Command(cmd)) => {
                debug!("esp: rx {:#06x}", cmd.raw());
                if let Some(old) = self.inbound.push_overwrite(cmd) {
                    warn!("esp: inbound queue full, dropped {:#06x}", old.raw());
                }
            }
            Some(Event::DeviceReady) => {
                self.sequencer.set_device_ready();
                if self.sequencer.state() == TxState::AwaitingDeviceReady {
                    self.link.listen_tx_ready();
                }
            }
            Some(Event::Connected(channel)) => {
                if !self.sequencer.greeting().is_empty() {
                    debug!("esp: greeting queued for {}", channel);
                    self.outbox.request_greeting(channel);
                    self.link.listen_tx_ready();
                }
            }
            None => {}
        }
    }

    /// Transmit-ready event: write at most one byte.
    ///
    /// Transmit-ready events are switched off while there is nothing to send or while waiting for
    /// the modem's prompt; queueing a command or receiving the prompt switches them back on.
    pub fn on_tx_ready(&mut self) -> TxAction {
        let action = self.sequencer.step(&mut self.outbox, &mut self.link);
        match action {
            TxAction::Sent | TxAction::Blocked => {}
            TxAction::AwaitingDevice | TxAction::Idle => self.link.unlisten_tx_ready(),
        }
        action
    }

    /// Oldest received command.
    #[inline]
    pub fn pop_command(&mut self) -> Option<Command> {
        self.inbound.pop()
    }

    /// Queue `cmd` for transmission. A full outbound queue hands the command back.
    pub fn push_command(&mut self, cmd: Command) -> Result<(), Command> {
        self.outbox.push(cmd)?;
        self.link.listen_tx_ready();
        Ok(())
    }

    #[inline]
    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Outbound commands not yet fully sent.
    #[inline]
    pub fn outbound_len(&self) -> usize {
        self.outbox.len()
    }

    #[inline]
    pub fn rx_state(&self) -> RxState {
        self.parser.state()
    }

    #[inline]
    pub fn tx_state(&self) -> TxState {
        self.sequencer.state()
    }

    #[inline]
    pub fn device_ready(&self) -> bool {
        self.sequencer.device_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use core::fmt::Write;

    #[derive(Default)]
    struct FakeLink {
        wire: Vec<u8>,
        listening: bool,
    }

    impl serial::Write<u8> for FakeLink {
        type Error = Infallible;

        fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
            self.wire.push(word);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), Infallible> {
            Ok(())
        }
    }

    impl ModemLink for FakeLink {
        fn listen_tx_ready(&mut self) {
            self.listening = true;
        }

        fn unlisten_tx_ready(&mut self) {
            self.listening = false;
        }
    }

    fn transport() -> Transport<FakeLink, 4> {
        Transport::new(FakeLink::default(), &ModemConfig::DEFAULT)
    }

    /// Service transmit-ready events the way the interrupt would.
    fn drain(t: &mut Transport<FakeLink, 4>) {
        while t.link().listening {
            t.on_tx_ready();
        }
    }

    fn feed_all(t: &mut Transport<FakeLink, 4>, bytes: &[u8]) {
        for &b in bytes {
            t.feed(b);
        }
    }

    #[test]
    fn frame_lands_in_inbound_queue() {
        let mut t = transport();
        feed_all(&mut t, b"+IPD,0,4:\x12\x05\x23\x06");
        assert_eq!(t.inbound_len(), 2);
        assert_eq!(t.pop_command(), Some(Command::from_rx_bytes(0x12, 0x05)));
        assert_eq!(t.pop_command(), Some(Command::from_rx_bytes(0x23, 0x06)));
        assert_eq!(t.pop_command(), None);
    }

    #[test]
    fn inbound_overflow_keeps_newest() {
        let mut t = transport();
        for i in 0..6u8 {
            feed_all(&mut t, b"+IPD,0,2:");
            feed_all(&mut t, &[0x15, i]);
        }
        assert_eq!(t.inbound_len(), 4);
        let data: Vec<u8> = core::iter::from_fn(|| t.pop_command()).map(|c| c.data()).collect();
        assert_eq!(data, vec![2, 3, 4, 5]);
    }

    #[test]
    fn tx_ready_events_stop_while_waiting_for_prompt() {
        let mut t = transport();
        let cmd = Command::new(0x5, 1, 90);
        t.push_command(cmd).unwrap();
        assert!(t.link().listening);

        drain(&mut t);
        assert_eq!(t.link().wire, b"AT+CIPSEND=0,2\r\n");
        assert_eq!(t.tx_state(), TxState::AwaitingDeviceReady);

        t.feed(b'>');
        assert!(t.link().listening);
        drain(&mut t);

        let mut expected = b"AT+CIPSEND=0,2\r\n".to_vec();
        expected.extend_from_slice(&cmd.to_tx_bytes());
        assert_eq!(t.link().wire, expected);
        assert_eq!(t.outbound_len(), 0);
        assert_eq!(t.tx_state(), TxState::Idle);
    }

    #[test]
    fn prompt_while_idle_does_not_wake_transmitter() {
        let mut t = transport();
        t.feed(b'>');
        assert!(!t.link().listening);
        assert!(t.device_ready());
    }

    #[test]
    fn full_outbox_hands_command_back() {
        let mut t = transport();
        for i in 0..4 {
            t.push_command(Command::new(0x5, 0, i)).unwrap();
        }
        let extra = Command::new(0x5, 0, 99);
        assert_eq!(t.push_command(extra), Err(extra));
        assert_eq!(t.outbound_len(), 4);
    }

    #[test]
    fn connection_queues_greeting() {
        let mut t = transport();
        feed_all(&mut t, b"2,CONNECT\r\n");
        assert!(t.link().listening);
        drain(&mut t);
        assert_eq!(t.link().wire, b"AT+CIPSEND=2,15\r\n");

        t.feed(b'>');
        drain(&mut t);
        assert!(t.link().wire.ends_with(ModemConfig::DEFAULT.greeting.as_bytes()));
    }

    #[test]
    fn reset_clears_everything() {
        let mut t = transport();
        feed_all(&mut t, b"+IPD,0,2:\x15\x01");
        t.push_command(Command::new(0x5, 0, 1)).unwrap();
        t.on_tx_ready();
        feed_all(&mut t, b"+IPD,0,");

        t.reset();
        assert_eq!(t.inbound_len(), 0);
        assert_eq!(t.outbound_len(), 0);
        assert_eq!(t.rx_state(), RxState::Idle);
        assert_eq!(t.tx_state(), TxState::Idle);
        assert!(!t.link().listening);
    }

    #[test]
    fn blocking_writer_writes_every_byte() {
        let mut link = FakeLink::default();
        write!(BlockingWriter(&mut link), "AT+CIPSTO={}\r\n", 60).unwrap();
        assert_eq!(link.wire, b"AT+CIPSTO=60\r\n");
    }
}

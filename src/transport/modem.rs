// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Main-loop side of the modem transport.

use embedded_hal::blocking::delay::DelayMs;
use log::{info, warn};

use crate::config::{ModemConfig, QUEUE_CAPACITY};
use crate::protocol::at::Directive;
use crate::protocol::Command;
use crate::transport::link::{BlockingWriter, ModemLink, Transport};
use crate::transport::shared::{IrqCell, IrqGate};

/// Handle the application uses to talk to the modem.
///
/// Every access to the shared [`Transport`] masks the link interrupt through `gate` for the
/// duration of a single queue operation.
pub struct Modem<'a, L, G, const N: usize = QUEUE_CAPACITY> {
    transport: &'a IrqCell<Transport<L, N>>,
    gate: G,
}

impl<'a, L: ModemLink, G: IrqGate, const N: usize> Modem<'a, L, G, N> {
    pub fn new(transport: &'a IrqCell<Transport<L, N>>, gate: G) -> Self {
        Self { transport, gate }
    }

    /// Run `f` on the transport with the link interrupt masked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Transport<L, N>) -> R) -> R {
        self.transport.lock(&self.gate, f)
    }

    /// Bring the modem up as an access point serving commands.
    ///
    /// Clears both queues, waits for the modem to boot, then writes each configuration directive
    /// with a short pause after it. The serial link must already be configured and the link
    /// interrupt enabled so the modem's replies are consumed by the parser.
    pub fn initialize<D: DelayMs<u32>>(&self, delay: &mut D, config: &ModemConfig) {
        self.with(Transport::reset);

        info!("esp: waiting {} ms for boot", config.startup_delay_ms);
        delay.delay_ms(config.startup_delay_ms);

        for directive in Directive::INIT_SEQUENCE {
            let sent = self.with(|t| directive.write_to(&mut BlockingWriter(t.link_mut()), config));
            if sent.is_err() {
                warn!("esp: failed to write {:?}", directive);
            }
            delay.delay_ms(config.directive_delay_ms);
        }

        info!(
            "esp: access point \"{}\" listening on port {}",
            config.ssid, config.server_port
        );
    }

    /// Oldest received command. With `blocking`, waits until one arrives.
    pub fn get_command(&self, blocking: bool) -> Option<Command> {
        if blocking {
            Some(self.wait_command())
        } else {
            self.with(Transport::pop_command)
        }
    }

    /// Wait for the next received command.
    pub fn wait_command(&self) -> Command {
        loop {
            if let Some(cmd) = self.with(Transport::pop_command) {
                return cmd;
            }
            self.gate.relax();
        }
    }

    /// Queue `cmd` for transmission, waiting while the outbound queue is full.
    pub fn send_command(&self, cmd: Command) {
        while self.try_send_command(cmd).is_err() {
            self.gate.relax();
        }
    }

    /// Queue `cmd` for transmission, or hand it back if the outbound queue is full.
    pub fn try_send_command(&self, cmd: Command) -> Result<(), Command> {
        self.with(|t| t.push_command(cmd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::{Cell, RefCell};
    use core::convert::Infallible;
    use embedded_hal::serial;

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

    /// Gate whose `relax` plays the part of the link interrupt.
    struct SimGate<'a> {
        cell: &'a IrqCell<Transport<FakeLink, 2>>,
        masked: Cell<bool>,
        /// Bytes the modem will send, one per relax.
        incoming: RefCell<Vec<u8>>,
        relaxes: Cell<u32>,
    }

    impl IrqGate for SimGate<'_> {
        fn mask(&self) {
            assert!(!self.masked.get());
            self.masked.set(true);
        }

        fn unmask(&self) {
            self.masked.set(false);
        }

        fn relax(&self) {
            assert!(!self.masked.get());
            self.relaxes.set(self.relaxes.get() + 1);
            // SAFETY: single-threaded test, no lock is active during relax.
            unsafe {
                self.cell.with_owner(|t| {
                    if t.link().listening {
                        t.on_tx_ready();
                    } else if !self.incoming.borrow().is_empty() {
                        let b = self.incoming.borrow_mut().remove(0);
                        t.feed(b);
                    }
                })
            }
        }
    }

    fn sim<'a>(cell: &'a IrqCell<Transport<FakeLink, 2>>, incoming: &[u8]) -> SimGate<'a> {
        SimGate {
            cell,
            masked: Cell::new(false),
            incoming: RefCell::new(incoming.to_vec()),
            relaxes: Cell::new(0),
        }
    }

    #[derive(Default)]
    struct FakeDelay {
        total_ms: u32,
        calls: u32,
    }

    impl DelayMs<u32> for FakeDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms;
            self.calls += 1;
        }
    }

    fn new_cell() -> IrqCell<Transport<FakeLink, 2>> {
        IrqCell::new(Transport::new(FakeLink::default(), &ModemConfig::DEFAULT))
    }

    #[test]
    fn initialize_writes_directives_in_order() {
        let cell = new_cell();
        let gate = sim(&cell, b"");
        let modem = Modem::new(&cell, &gate);
        let mut delay = FakeDelay::default();

        modem.try_send_command(Command::new(0x5, 0, 1)).unwrap();
        modem.initialize(&mut delay, &ModemConfig::DEFAULT);

        let wire = modem.with(|t| String::from_utf8(t.link().wire.clone()).unwrap());
        assert_eq!(
            wire,
            "ATE0\r\nAT+CWMODE=2\r\nAT+CWSAP=\"Thing\",\"\",5,0\r\nAT+CIPMUX=1\r\n\
             AT+CIPSTO=60\r\nAT+CIPSERVER=1,333\r\n"
        );
        assert_eq!(modem.with(|t| t.outbound_len()), 0);
        assert_eq!(delay.calls, 7);
        assert_eq!(delay.total_ms, 1000 + 6 * 10);
    }

    #[test]
    fn non_blocking_get_on_empty_queue() {
        let cell = new_cell();
        let gate = sim(&cell, b"");
        let modem = Modem::new(&cell, &gate);
        assert_eq!(modem.get_command(false), None);
        assert_eq!(gate.relaxes.get(), 0);
    }

    #[test]
    fn blocking_get_waits_for_a_frame() {
        let cell = new_cell();
        let gate = sim(&cell, b"+IPD,0,2:\x25\x5a");
        let modem = Modem::new(&cell, &gate);

        let cmd = modem.get_command(true);
        assert_eq!(cmd, Some(Command::from_rx_bytes(0x25, 0x5a)));
        assert_eq!(cmd.map(|c| c.opcode_bits()), Some(0x5));
        assert_eq!(cmd.map(|c| c.target()), Some(2));
        assert_eq!(cmd.map(|c| c.data()), Some(0x5a));
        assert_eq!(gate.relaxes.get(), 11);
    }

    #[test]
    fn send_waits_while_outbound_is_full() {
        let cell = new_cell();
        let gate = sim(&cell, b">>");
        let modem = Modem::new(&cell, &gate);
        let cmds = [
            Command::new(0x5, 0, 10),
            Command::new(0x5, 1, 20),
            Command::new(0x6, 2, 30),
        ];

        modem.send_command(cmds[0]);
        modem.send_command(cmds[1]);
        assert_eq!(gate.relaxes.get(), 0);

        // Frees a slot only once the first command is fully on the wire.
        modem.send_command(cmds[2]);
        assert!(gate.relaxes.get() > 0);

        let wire = modem.with(|t| t.link().wire.clone());
        let mut expected = b"AT+CIPSEND=0,2\r\n".to_vec();
        expected.extend_from_slice(&cmds[0].to_tx_bytes());
        assert!(wire.starts_with(&expected));
        assert_eq!(modem.with(|t| t.outbound_len()), 2);
    }
}

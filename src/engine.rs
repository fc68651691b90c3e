//! See [`Engine`] for more details.

use alloc::vec::Vec;

use log::{debug, warn};

use crate::ascii::LF;
use crate::command::Command;
use crate::context::{Context, Link};
use crate::parser::{Parser, State};
use crate::ring_buffer::RingBuffer;
use crate::tokenizer::Tokenizer;

/// Receive buffer size used by [`Engine::new`].
pub const DEFAULT_RX_CAPACITY: usize = 256;

/// Maximum number of steps taken by one [`Engine::poll`] call.
pub const POLL_BUDGET: usize = 1024;

/// Outcome of [`Engine::step`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    /// Input was consumed, there may be more to do.
    Progress,
    /// Nothing can be done until more data is received.
    Idle,
}

/// Command processor for one serial link.
///
/// The engine is driven from the outside: feed it the received bytes, let it
/// work through them a step at a time, and send what it produced.
///
/// # Example
///
/// ```
/// use mft_proto::{mft, Engine, Step};
/// # use std::io::{Read, Write, Cursor};
/// # fn connect_serial_interface() -> Result<Cursor<Vec<u8>>, &'static str>
/// # { Ok(Cursor::new(b"GVER\n".to_vec())) }
/// #
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut engine = Engine::new(mft::COMMANDS, mft::Mft::default());
/// let mut serial = connect_serial_interface()?;
///
/// 'main: loop {
///     let mut buf = [0; 16];
///     let len = serial.read(&mut buf)?;
///     if len == 0 {
///         break 'main;
///     }
///     engine.receive_data(&buf[..len]);
///     // other periodic duties can run between steps
///     while engine.step() == Step::Progress {}
///     serial.write_all(&engine.take_output())?;
/// }
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Engine<C: 'static> {
    rx: RingBuffer,
    tokenizer: Tokenizer,
    parser: Parser,
    table: &'static [Command<C>],
    ctx: Context<C>,
    dropped: usize,
}

impl<C: 'static> Engine<C> {
    /// Create an engine serving `table`, with a receive buffer of
    /// [`DEFAULT_RX_CAPACITY`] bytes.
    pub fn new(table: &'static [Command<C>], device: C) -> Self {
        Self::with_capacity(table, device, DEFAULT_RX_CAPACITY)
    }

    /// Create an engine with a receive buffer of `rx_capacity` bytes.
    pub fn with_capacity(table: &'static [Command<C>], device: C, rx_capacity: usize) -> Self {
        Self {
            rx: RingBuffer::new(rx_capacity),
            tokenizer: Tokenizer::new(),
            parser: Parser::default(),
            table,
            ctx: Context::new(device),
            dropped: 0,
        }
    }

    /// Queue received bytes. Returns how many were accepted, the rest
    /// didn't fit in the receive buffer and are dropped.
    pub fn receive_data(&mut self, data: &[u8]) -> usize {
        let accepted = self.rx.extend(data);
        if accepted < data.len() {
            self.dropped += data.len() - accepted;
            warn!("Receive buffer full, dropped {} bytes", data.len() - accepted);
        }
        accepted
    }

    /// Queue a single received byte.
    /// # Errors
    /// Returns the byte back if the receive buffer is full.
    pub fn receive_byte(&mut self, byte: u8) -> Result<(), u8> {
        self.rx.put(byte).map_err(|byte| {
            self.dropped += 1;
            byte
        })
    }

    /// Process at most one token of input.
    pub fn step(&mut self) -> Step {
        self.ctx.link.rx_free = self.rx.remaining();
        let step = self
            .parser
            .step(&mut self.rx, &mut self.tokenizer, self.table, &mut self.ctx);
        if let Some(line) = self.ctx.link.take_replay() {
            debug!("Replaying {:?}", line.as_str());
            // Link::replay checked the free space
            self.rx.extend(line.as_bytes());
            let _ = self.rx.put(LF);
        }
        step
    }

    /// Step until idle, or [`POLL_BUDGET`] steps have been taken.
    /// Returns the number of steps that made progress.
    pub fn poll(&mut self) -> usize {
        let mut steps = 0;
        while steps < POLL_BUDGET && self.step() == Step::Progress {
            steps += 1;
        }
        steps
    }

    /// Bytes waiting to be sent to the host.
    pub fn output(&self) -> &[u8] {
        self.ctx.link.output()
    }

    /// Take the bytes waiting to be sent to the host.
    pub fn take_output(&mut self) -> Vec<u8> {
        self.ctx.link.take_output()
    }

    pub fn state(&self) -> State {
        self.parser.state()
    }

    /// True while the rest of a line is copied into a string.
    pub fn is_capturing(&self) -> bool {
        self.parser.is_capturing()
    }

    /// Complete command lines waiting in the receive buffer.
    pub fn pending_commands(&self) -> usize {
        self.rx.pending_commands()
    }

    /// Bytes waiting in the receive buffer.
    pub fn queued(&self) -> usize {
        self.rx.len()
    }

    /// Number of received bytes lost to a full receive buffer.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn table(&self) -> &'static [Command<C>] {
        self.table
    }

    pub fn device(&self) -> &C {
        &self.ctx.device
    }

    pub fn device_mut(&mut self) -> &mut C {
        &mut self.ctx.device
    }

    pub fn link(&self) -> &Link {
        &self.ctx.link
    }

    pub fn link_mut(&mut self) -> &mut Link {
        &mut self.ctx.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Action, Target};
    use crate::Text;

    #[derive(Debug, Default)]
    struct Dev {
        count: i32,
        script: Text,
    }

    type Cmd = Command<Dev>;

    fn bump(ctx: &mut Context<Dev>) {
        ctx.device.count += 1;
        ctx.link.ack();
    }

    fn play(ctx: &mut Context<Dev>) {
        let script = ctx.device.script;
        match ctx.link.replay(&script) {
            Ok(()) => ctx.link.ack(),
            Err(err) => ctx.link.fail(err),
        }
    }

    static TABLE: &[Cmd] = &[
        Cmd::call("BUMP", Action::Nullary(bump)),
        Cmd::get("GCNT", Target::Int(|c| &mut c.device.count)),
        Cmd::capture("SSCRIPT", |c| &mut c.device.script),
        Cmd::call("PLAY", Action::Nullary(play)),
    ];

    #[test]
    fn test_poll() {
        let mut engine = Engine::new(TABLE, Dev::default());
        assert_eq!(engine.receive_data(b"BUMP;BUMP\nGCNT\n"), 15);
        assert!(engine.poll() > 0);
        assert_eq!(engine.take_output(), b"\x06\x06\x062\n");
        assert_eq!(engine.poll(), 0);
        assert_eq!(engine.state(), State::AwaitCommand);
    }

    #[test]
    fn test_overflow() {
        let mut engine = Engine::with_capacity(TABLE, Dev::default(), 8);
        assert_eq!(engine.receive_data(b"BUMP;BUMP;"), 8);
        assert_eq!(engine.dropped(), 2);
        assert_eq!(engine.receive_byte(b'x'), Err(b'x'));
        engine.poll();
        assert_eq!(engine.device().count, 1);
        assert_eq!(engine.queued(), 0);
    }

    #[test]
    fn test_zero_capacity() {
        let mut engine = Engine::with_capacity(TABLE, Dev::default(), 0);
        assert_eq!(engine.receive_data(b"BUMP\n"), 1);
        assert_eq!(engine.dropped(), 4);
    }

    #[test]
    fn test_replay() {
        let mut engine = Engine::new(TABLE, Dev::default());
        engine.receive_data(b"SSCRIPT,BUMP;BUMP;GCNT\nPLAY\n");
        engine.poll();
        assert_eq!(engine.take_output(), b"\x06\x06\x06\x06\x062\n");
        assert_eq!(engine.device().count, 2);
    }

    #[test]
    fn test_replay_too_long() {
        let mut engine = Engine::with_capacity(TABLE, Dev::default(), 15);
        engine.receive_data(b"SSCRIPT,BUMP;");
        engine.poll();
        engine.receive_data(b"BUMP;BUMP\n");
        engine.poll();
        assert_eq!(engine.device().script.as_str(), "BUMP;BUMP;BUMP");
        engine.take_output();
        engine.receive_data(b"PLAY\n");
        engine.poll();
        assert_eq!(engine.take_output(), b"\x15");
        assert_eq!(engine.link().last_error(), Some(crate::Error::OutOfRange));
    }
}

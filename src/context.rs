use alloc::vec::Vec;
use core::fmt::{self, Display, Write};

use log::debug;

use crate::ascii::{ACK, NAK};
use crate::command::Text;
use crate::error::Error;

/// Everything a command handler can reach: the device it controls and the
/// state of the serial link.
#[derive(Debug)]
pub struct Context<C> {
    pub device: C,
    pub link: Link,
}

impl<C> Context<C> {
    pub fn new(device: C) -> Self {
        Self {
            device,
            link: Link::new(),
        }
    }
}

/// Protocol level state shared by all commands, and the outgoing byte queue.
///
/// Implements [`core::fmt::Write`], so handlers can `writeln!` their
/// replies. Nothing is written while the link is muted.
#[derive(Debug, Default)]
pub struct Link {
    /// Mirror received tokens back to the host.
    pub echo: bool,
    /// Suppress all output.
    pub mute: bool,
    /// Code of the last error, see [`Error::code`]. 0 if none was recorded.
    pub error_code: i32,
    out: Vec<u8>,
    replay: Option<Text>,
    pub(crate) rx_free: usize,
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acknowledge a command that has no value to report.
    pub fn ack(&mut self) {
        self.marker(ACK);
        if self.echo {
            self.write_bytes(b"\n");
        }
    }

    /// Acknowledge a command whose value follows on the same line.
    pub fn ack_only(&mut self) {
        self.marker(ACK);
    }

    /// Reject a command without recording an error.
    pub fn nak(&mut self) {
        self.marker(NAK);
        if self.echo {
            self.write_bytes(b"\n");
        }
    }

    /// Record `error` as the last error and reject the command.
    pub fn fail(&mut self, error: Error) {
        debug!("Command failed: {}", error);
        self.error_code = error.code();
        self.nak();
    }

    /// Acknowledge and report `value` on its own line.
    pub fn reply(&mut self, value: impl Display) {
        self.ack_only();
        self.println(value);
    }

    pub fn println(&mut self, value: impl Display) {
        let _ = writeln!(self, "{}", value);
    }

    /// The error recorded last, if any.
    pub fn last_error(&self) -> Option<Error> {
        Error::from_code(self.error_code)
    }

    /// Queue a command line to be parsed as if received from the host.
    /// # Errors
    /// Returns [`Error::OutOfRange`] if the line doesn't fit in the receive
    /// buffer, or if another line is already queued.
    pub fn replay(&mut self, line: &str) -> Result<(), Error> {
        if self.replay.is_some() || line.len() + 1 > self.rx_free {
            return Err(Error::OutOfRange);
        }
        let mut queued = Text::new();
        queued.try_push_str(line).map_err(|_| Error::OutOfRange)?;
        self.replay = Some(queued);
        Ok(())
    }

    pub(crate) fn take_replay(&mut self) -> Option<Text> {
        self.replay.take()
    }

    /// Bytes waiting to be sent.
    pub fn output(&self) -> &[u8] {
        &self.out
    }

    /// Take the bytes waiting to be sent.
    pub fn take_output(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.out)
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        if !self.mute {
            self.out.extend_from_slice(bytes);
        }
    }

    fn marker(&mut self, byte: u8) {
        if self.echo {
            self.write_bytes(&[b',', byte]);
        } else {
            self.write_bytes(&[byte]);
        }
    }
}

impl Write for Link {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

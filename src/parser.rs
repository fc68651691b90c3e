//! The command parser state machine.
//!
//! Each call to [`Parser::step`] consumes at most one token, or one raw byte
//! while capturing a long string, and returns. Partial commands are kept in
//! the parser until the rest of the line arrives.

use log::{debug, trace, warn};
use snafu::{ensure, OptionExt};

use crate::ascii::{to_char, COMMA, LF};
use crate::command::{lookup, Command, Target};
use crate::context::{Context, Link};
use crate::dispatch::execute;
use crate::engine::Step;
use crate::error::{BadArgumentSnafu, Error, ExpectedDelimiterSnafu};
use crate::nom_parser::{float_prefix, int_prefix};
use crate::ring_buffer::RingBuffer;
use crate::tokenizer::{is_terminator_token, Token, Tokenizer};

/// Parser states between tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// Waiting for a command name.
    AwaitCommand,
    CollectArg1,
    CollectArg2,
    CollectArg3,
    /// All arguments are in, waiting for `;` or a newline.
    AwaitTerminator,
    /// A line mode command is waiting for its line to be complete.
    AwaitRawLine,
}

/// A received argument, in all the forms a handler may ask for.
#[derive(Debug, Default, Copy, Clone)]
pub(crate) struct Arg {
    pub int: i32,
    pub float: f32,
    pub text: Token,
}

impl Arg {
    pub(crate) fn parse(token: &str) -> Self {
        let text = token.trim();
        Self {
            int: int_prefix(text),
            float: float_prefix(text),
            text: Token::from(text).unwrap_or_default(),
        }
    }
}

#[derive(Debug)]
struct Capture {
    command: usize,
    max: usize,
    truncated: bool,
}

#[derive(Debug)]
pub(crate) struct Parser {
    state: State,
    command: Option<usize>,
    args: [Arg; 3],
    capture: Option<Capture>,
    echo_delimiter: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            state: State::AwaitCommand,
            command: None,
            args: Default::default(),
            capture: None,
            echo_delimiter: false,
        }
    }
}

impl Parser {
    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Advance the state machine by one token.
    pub fn step<C>(
        &mut self,
        rx: &mut RingBuffer,
        tokenizer: &mut Tokenizer,
        table: &[Command<C>],
        ctx: &mut Context<C>,
    ) -> Step {
        if self.state == State::AwaitRawLine {
            return self.run_line(rx, tokenizer, table, ctx);
        }
        if self.capture.is_some() {
            return self.capture_byte(rx, table, ctx);
        }

        let queued = rx.len();
        let token = match tokenizer.next_token(rx, false) {
            Some(token) => token,
            None if rx.len() != queued => return Step::Progress,
            None => return Step::Idle,
        };

        // everything but the newline is mirrored, `;` included
        if token.as_str() == "\n" {
            self.echo_delimiter = false;
        } else {
            self.echo(&token, &mut ctx.link);
        }

        match self.state {
            State::AwaitCommand => self.resolve(&token, rx, table, ctx),
            State::CollectArg1 => self.collect(0, &token, table),
            State::CollectArg2 => self.collect(1, &token, table),
            State::CollectArg3 => self.collect(2, &token, table),
            State::AwaitTerminator => self.terminate(&token, table, ctx),
            State::AwaitRawLine => {}
        }
        Step::Progress
    }

    fn resolve<C>(
        &mut self,
        name: &str,
        rx: &mut RingBuffer,
        table: &[Command<C>],
        ctx: &mut Context<C>,
    ) {
        if is_terminator_token(name) {
            return;
        }
        let index = match lookup(table, name) {
            Some(index) => index,
            None => {
                debug!("Unknown command {:?}", name);
                ctx.link.fail(Error::BadCommand);
                return;
            }
        };
        let command = &table[index];
        debug!("Received {:?}", command);
        self.command = Some(index);
        self.args = Default::default();

        self.state = match command.target {
            Target::Line(_) => State::AwaitRawLine,
            Target::Capture(slot) => {
                slot(ctx).clear();
                self.capture = Some(Capture {
                    command: index,
                    max: command.arity,
                    truncated: false,
                });
                // the delimiter after the name is always queued at this point
                if rx.peek() == Some(COMMA) {
                    rx.get();
                }
                State::AwaitCommand
            }
            _ if command.arity > 0 => State::CollectArg1,
            _ => State::AwaitTerminator,
        };
        trace!("state {:?}", self.state);
    }

    fn collect<C>(&mut self, n: usize, token: &str, table: &[Command<C>]) {
        self.args[n] = Arg::parse(token);
        let arity = match self.command {
            Some(index) => table[index].arity,
            None => {
                self.state = State::AwaitCommand;
                return;
            }
        };
        self.state = match n + 1 {
            count if count >= arity => State::AwaitTerminator,
            1 => State::CollectArg2,
            _ => State::CollectArg3,
        };
        trace!("state {:?}", self.state);
    }

    fn terminate<C>(&mut self, token: &str, table: &[Command<C>], ctx: &mut Context<C>) {
        self.state = State::AwaitCommand;
        let command = self.command.take();
        if !is_terminator_token(token) {
            debug!("Expected end of command, got {:?}", token);
            ctx.link.nak();
            return;
        }
        if let Some(index) = command {
            execute(&table[index], &self.args, ctx);
        }
    }

    fn run_line<C>(
        &mut self,
        rx: &mut RingBuffer,
        tokenizer: &mut Tokenizer,
        table: &[Command<C>],
        ctx: &mut Context<C>,
    ) -> Step {
        if rx.pending_commands() == 0 {
            return Step::Idle;
        }
        self.state = State::AwaitCommand;
        if let Some(index) = self.command.take() {
            if let Target::Line(handler) = table[index].target {
                let mut line = LineReader {
                    rx,
                    tokenizer,
                    line_done: false,
                };
                handler(ctx, &mut line);
                line.skip_line();
            }
        }
        Step::Progress
    }

    fn capture_byte<C>(
        &mut self,
        rx: &mut RingBuffer,
        table: &[Command<C>],
        ctx: &mut Context<C>,
    ) -> Step {
        let byte = match rx.get() {
            Some(byte) => byte,
            None => return Step::Idle,
        };
        let capture = match self.capture.as_mut() {
            Some(capture) => capture,
            None => return Step::Idle,
        };
        let slot = match table[capture.command].target {
            Target::Capture(slot) => slot,
            _ => {
                self.capture = None;
                return Step::Progress;
            }
        };
        // CR comes out of the ring buffer as LF, so it ends the capture too
        if byte == LF {
            trace!("captured {:?}", slot(ctx).as_str());
            self.capture = None;
            self.echo_delimiter = false;
            ctx.link.ack();
            return Step::Progress;
        }
        let dest = slot(ctx);
        // one byte stays reserved, captures hold at most max - 1 characters
        if dest.len() + 1 >= capture.max || dest.try_push(to_char(byte)).is_err() {
            if !capture.truncated {
                warn!("Long string truncated at {} bytes", dest.len());
                capture.truncated = true;
            }
        }
        Step::Progress
    }

    fn echo(&mut self, token: &str, link: &mut Link) {
        if !link.echo || link.mute {
            return;
        }
        if self.echo_delimiter {
            link.write_bytes(b",");
        }
        link.write_bytes(token.as_bytes());
        self.echo_delimiter = true;
    }
}

/// Access to the input stream for line mode commands.
///
/// Delimiters are returned as tokens, so handlers can define their own
/// grammar. Whatever the handler leaves of its line is discarded.
pub struct LineReader<'a> {
    rx: &'a mut RingBuffer,
    tokenizer: &'a mut Tokenizer,
    line_done: bool,
}

impl LineReader<'_> {
    /// The next token, delimiters included. `None` once the line is consumed.
    pub fn next_token(&mut self) -> Option<Token> {
        if self.line_done {
            return None;
        }
        let token = self.tokenizer.next_token(self.rx, true)?;
        if is_terminator_token(&token) {
            self.line_done = true;
        }
        Some(token)
    }

    /// Read `delimiter` followed by a field.
    /// # Errors
    /// [`Error::ExpectedDelimiter`] if the next token isn't `delimiter`,
    /// [`Error::BadArgument`] if the line ends after it.
    pub fn expect(&mut self, delimiter: char) -> Result<Token, Error> {
        let token = self.next_token().context(ExpectedDelimiterSnafu)?;
        ensure!(
            token.len() == 1 && token.starts_with(delimiter),
            ExpectedDelimiterSnafu
        );
        let field = self.next_token().context(BadArgumentSnafu)?;
        ensure!(!is_terminator_token(&field), BadArgumentSnafu);
        Ok(field)
    }

    /// Read the next comma separated argument, whitespace trimmed.
    pub fn arg(&mut self) -> Result<Token, Error> {
        let field = self.expect(',')?;
        Ok(Token::from(field.trim()).unwrap_or_default())
    }

    /// Complete lines still queued, including the current one.
    pub fn pending_commands(&self) -> usize {
        self.rx.pending_commands()
    }

    fn skip_line(&mut self) {
        while self.next_token().is_some() {}
    }
}

//! This crate implements the serial command protocol of the MFT twave switch
//! controller, in a sans-io fashion.
//!
//! Commands are plain ASCII lines of the form `NAME[,arg1[,arg2[,arg3]]]`,
//! terminated by `;` or a newline. Every command is answered with an ACK
//! (0x06), optionally followed by a value line, or with a NAK (0x15).
//!
//! The [`Engine`] owns the receive ring buffer, the tokenizer and the parser
//! state machine. It never blocks and never touches an IO device: received
//! bytes are fed with [`Engine::receive_data`], the protocol is advanced with
//! [`Engine::step`] or [`Engine::poll`], and the response bytes are picked up
//! with [`Engine::take_output`].
//!
//! ## Example
//! ```
//! use mft_proto::{mft, Engine};
//!
//! let mut engine = Engine::new(mft::COMMANDS, mft::Mft::default());
//! engine.receive_data(b"SFREQ,1000;GFREQ\n");
//! engine.poll();
//! assert_eq!(engine.take_output(), b"\x06\x061000\n");
//! ```
//!
//! Device specific behavior lives in a command table, a static slice of
//! [`Command`] descriptors bound to a context type. See the [`mft`] module
//! for the table of the MFT board.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod ascii;
mod command;
mod context;
mod dispatch;
mod engine;
mod error;
pub mod mft;
mod nom_parser;
mod parser;
mod ring_buffer;
mod tokenizer;

pub use crate::command::{lookup, Action, Command, Kind, LineFn, Slot, Target, Text, TEXT_CAPACITY};
pub use crate::context::{Context, Link};
pub use crate::engine::{Engine, Step, DEFAULT_RX_CAPACITY, POLL_BUDGET};
pub use crate::error::Error;
pub use crate::parser::{LineReader, State};
pub use crate::ring_buffer::RingBuffer;
pub use crate::tokenizer::{Token, Tokenizer, TOKEN_CAPACITY};

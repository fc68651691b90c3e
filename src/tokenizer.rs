use arrayvec::ArrayString;
use log::{trace, warn};

use crate::ascii::{is_delimiter, to_char, COMMA};
use crate::ring_buffer::RingBuffer;

/// Maximum number of characters kept in a token, longer fields are truncated.
pub const TOKEN_CAPACITY: usize = 19;

/// A single field extracted from the input stream.
pub type Token = ArrayString<TOKEN_CAPACITY>;

/// Incremental, non-blocking tokenizer.
///
/// A field is complete once the delimiter following it is in the buffer. The
/// delimiter is left in place and comes out as a one character token on the
/// next call. Partially received fields are kept between calls.
#[derive(Debug, Default)]
pub struct Tokenizer {
    partial: Token,
    truncated: bool,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the next token from `rx`.
    ///
    /// Returns `None` when the buffer runs dry before a token is complete.
    /// A lone `,` token is swallowed, returning `None`, unless
    /// `return_comma` is set.
    pub fn next_token(&mut self, rx: &mut RingBuffer, return_comma: bool) -> Option<Token> {
        loop {
            let byte = rx.peek()?;
            if is_delimiter(byte) {
                if !self.partial.is_empty() {
                    return Some(self.finish());
                }
                rx.get();
                if byte == COMMA && !return_comma {
                    return None;
                }
                let mut token = Token::new();
                token.push(to_char(byte));
                trace!("delimiter token {:?}", token);
                return Some(token);
            }
            rx.get();
            if self.partial.try_push(to_char(byte)).is_err() {
                self.truncated = true;
            }
        }
    }

    /// Characters of the token currently being received.
    pub fn partial(&self) -> &str {
        &self.partial
    }

    /// Forget a partially received token.
    pub fn reset(&mut self) {
        self.partial.clear();
        self.truncated = false;
    }

    fn finish(&mut self) -> Token {
        if self.truncated {
            warn!("Token truncated to {:?}", self.partial);
            self.truncated = false;
        }
        trace!("token {:?}", self.partial);
        core::mem::take(&mut self.partial)
    }
}

/// True for the tokens ending a command.
pub(crate) fn is_terminator_token(token: &str) -> bool {
    token == ";" || token == "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec::Vec;

    fn tokens(rx: &mut RingBuffer, tokenizer: &mut Tokenizer) -> Vec<String> {
        let mut out = Vec::new();
        while !rx.is_empty() {
            if let Some(token) = tokenizer.next_token(rx, false) {
                out.push(String::from(token.as_str()));
            }
        }
        out
    }

    #[test]
    fn test_command_line() {
        let mut rx = RingBuffer::new(64);
        let mut tokenizer = Tokenizer::new();
        rx.extend(b"SFREQ,1,1000;");
        assert_eq!(tokens(&mut rx, &mut tokenizer), ["SFREQ", "1", "1000", ";"]);
        assert_eq!(rx.pending_commands(), 0);
    }

    #[test]
    fn test_delimiters_visible() {
        let mut rx = RingBuffer::new(64);
        let mut tokenizer = Tokenizer::new();
        rx.extend(b"A,[b]:c\r");
        let mut out = Vec::new();
        while let Some(token) = tokenizer.next_token(&mut rx, true) {
            out.push(String::from(token.as_str()));
        }
        assert_eq!(out, ["A", ",", "[", "b", "]", ":", "c", "\n"]);
    }

    #[test]
    fn test_resumable() {
        let mut rx = RingBuffer::new(64);
        let mut tokenizer = Tokenizer::new();
        rx.extend(b"GFR");
        assert_eq!(tokenizer.next_token(&mut rx, false), None);
        assert_eq!(tokenizer.partial(), "GFR");
        rx.extend(b"EQ");
        assert_eq!(tokenizer.next_token(&mut rx, false), None);
        rx.extend(b"\n");
        assert_eq!(tokenizer.next_token(&mut rx, false).unwrap().as_str(), "GFREQ");
        // the delimiter is still queued
        assert_eq!(rx.pending_commands(), 1);
        assert_eq!(tokenizer.next_token(&mut rx, false).unwrap().as_str(), "\n");
        assert_eq!(tokenizer.next_token(&mut rx, false), None);
    }

    #[test]
    fn test_truncation() {
        let mut rx = RingBuffer::new(64);
        let mut tokenizer = Tokenizer::new();
        rx.extend(b"ABCDEFGHIJKLMNOPQRSTUVWXYZ;");
        let token = tokenizer.next_token(&mut rx, false).unwrap();
        assert_eq!(token.len(), TOKEN_CAPACITY);
        assert_eq!(token.as_str(), "ABCDEFGHIJKLMNOPQRS");
        assert_eq!(tokenizer.next_token(&mut rx, false).unwrap().as_str(), ";");
    }

    #[test]
    fn test_terminator_token() {
        assert!(is_terminator_token(";"));
        assert!(is_terminator_token("\n"));
        assert!(!is_terminator_token(","));
    }
}

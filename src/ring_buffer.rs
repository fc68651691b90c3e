use alloc::boxed::Box;
use alloc::vec;

use crate::ascii::{is_terminator, normalize, LF, SEMICOLON};

/// Fixed capacity receive queue between the byte source and the parser.
///
/// Besides the bytes it counts the command terminators (`;`, CR and LF)
/// currently queued, so the parser can tell whether a complete line has
/// arrived. CR is handed out as LF.
///
/// The storage is allocated once, at construction. Writers append at the
/// tail, the tokenizer removes at the head.
#[derive(Debug)]
pub struct RingBuffer {
    data: Box<[u8]>,
    head: usize,
    tail: usize,
    count: usize,
    commands: usize,
}

impl RingBuffer {
    /// Create an empty ring buffer holding at most `capacity` bytes. A
    /// capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity.max(1)].into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
            commands: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Free space in bytes.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.count
    }

    /// Number of command terminators waiting in the buffer.
    pub fn pending_commands(&self) -> usize {
        self.commands
    }

    /// Append a byte at the tail.
    /// # Errors
    /// Returns the byte back if the buffer is full.
    pub fn put(&mut self, byte: u8) -> Result<(), u8> {
        if self.is_full() {
            return Err(byte);
        }
        self.data[self.tail] = byte;
        self.tail = self.wrap_inc(self.tail);
        self.count += 1;
        if is_terminator(byte) {
            self.commands += 1;
        }
        Ok(())
    }

    /// Insert a byte at the head, so it is the next one returned by
    /// [`get`](Self::get).
    /// # Errors
    /// Returns the byte back if the buffer is full.
    pub fn push_front(&mut self, byte: u8) -> Result<(), u8> {
        if self.is_full() {
            return Err(byte);
        }
        self.head = if self.head == 0 {
            self.capacity() - 1
        } else {
            self.head - 1
        };
        self.data[self.head] = byte;
        self.count += 1;
        if is_terminator(byte) {
            self.commands += 1;
        }
        Ok(())
    }

    /// Remove the byte at the head, CR is returned as LF.
    ///
    /// An empty buffer also clears the terminator count.
    pub fn get(&mut self) -> Option<u8> {
        if self.is_empty() {
            self.commands = 0;
            return None;
        }
        let byte = normalize(self.data[self.head]);
        self.head = self.wrap_inc(self.head);
        self.count -= 1;
        if byte == SEMICOLON || byte == LF {
            self.commands = self.commands.saturating_sub(1);
        }
        Some(byte)
    }

    /// Return the byte at the head without removing it, CR is returned as LF.
    pub fn peek(&self) -> Option<u8> {
        if self.is_empty() {
            None
        } else {
            Some(normalize(self.data[self.head]))
        }
    }

    /// Append as many bytes as fit, returning the number accepted.
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().take_while(|&&b| self.put(b).is_ok()).count()
    }

    /// Drop everything, including the terminator count.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
        self.commands = 0;
    }

    fn wrap_inc(&self, index: usize) -> usize {
        if index + 1 >= self.capacity() {
            0
        } else {
            index + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn drain(rb: &mut RingBuffer) -> Vec<u8> {
        core::iter::from_fn(|| rb.get()).collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut rb = RingBuffer::new(8);
        // wrap around a few times
        for _ in 0..3 {
            assert_eq!(rb.extend(b"ab\rcd"), 5);
            assert_eq!(drain(&mut rb), b"ab\ncd");
        }
        assert!(rb.is_empty());
    }

    #[test]
    fn test_full() {
        let mut rb = RingBuffer::new(4);
        assert_eq!(rb.extend(b"abcdef"), 4);
        assert!(rb.is_full());
        assert_eq!(rb.put(b'x'), Err(b'x'));
        assert_eq!(rb.push_front(b'x'), Err(b'x'));
        assert_eq!(rb.get(), Some(b'a'));
        assert_eq!(rb.remaining(), 1);
    }

    #[test]
    fn test_pending_commands() {
        let mut rb = RingBuffer::new(16);
        rb.extend(b"A,1,2;");
        assert_eq!(rb.pending_commands(), 1);
        for _ in 0..5 {
            rb.get();
            assert_eq!(rb.pending_commands(), 1);
        }
        assert_eq!(rb.get(), Some(b';'));
        assert_eq!(rb.pending_commands(), 0);

        rb.extend(b"x\r\n");
        assert_eq!(rb.pending_commands(), 2);
        assert_eq!(drain(&mut rb), b"x\n\n");
        assert_eq!(rb.pending_commands(), 0);
    }

    #[test]
    fn test_push_front() {
        let mut rb = RingBuffer::new(4);
        rb.extend(b"bc");
        rb.push_front(b'\r').unwrap();
        assert_eq!(rb.pending_commands(), 1);
        assert_eq!(rb.peek(), Some(b'\n'));
        assert_eq!(drain(&mut rb), b"\nbc");
        assert_eq!(rb.pending_commands(), 0);
    }

    #[test]
    fn test_zero_capacity() {
        let mut rb = RingBuffer::new(0);
        assert_eq!(rb.capacity(), 1);
        assert_eq!(rb.put(b'a'), Ok(()));
        assert_eq!(rb.put(b'b'), Err(b'b'));
        assert_eq!(rb.get(), Some(b'a'));
    }

    #[test]
    fn test_empty_resets_count() {
        let mut rb = RingBuffer::new(4);
        rb.extend(b";");
        rb.clear();
        rb.extend(b"a");
        rb.commands = 3; // simulate a drifted count
        assert_eq!(rb.get(), Some(b'a'));
        assert_eq!(rb.get(), None);
        assert_eq!(rb.pending_commands(), 0);
        assert_eq!(rb.peek(), None);
    }
}

//! Control bytes and delimiters used on the wire.

/// Positive acknowledgement.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement.
pub const NAK: u8 = 0x15;
pub const LF: u8 = b'\n';
pub const CR: u8 = b'\r';

/// Byte marking the end of a command line, besides LF.
pub const SEMICOLON: u8 = b';';
/// Argument separator.
pub const COMMA: u8 = b',';

/// Bytes that end a token. CR never shows up here since the ring buffer
/// hands it out as LF.
pub(crate) const fn is_delimiter(byte: u8) -> bool {
    matches!(byte, LF | SEMICOLON | b':' | COMMA | b'[' | b']')
}

/// Bytes counted by the ring buffer as the end of a command.
pub(crate) const fn is_terminator(byte: u8) -> bool {
    matches!(byte, LF | CR | SEMICOLON)
}

/// Map CR to LF, leave everything else alone.
pub(crate) const fn normalize(byte: u8) -> u8 {
    if byte == CR {
        LF
    } else {
        byte
    }
}

/// Convert a received byte to a char, mapping all non-ASCII bytes to NUL.
///
/// Tokens and captured strings are `str`, so 8 bit bytes don't survive the
/// conversion: they are stored as NUL and can't be recovered.
pub(crate) fn to_char(byte: u8) -> char {
    if byte > 0x7f {
        '\0'
    } else {
        char::from(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiters() {
        for &d in b"\n;:,[]" {
            assert!(is_delimiter(d));
        }
        assert!(!is_delimiter(b'\r'));
        assert!(!is_delimiter(b' '));
        assert!(!is_delimiter(b'A'));
    }

    #[test]
    fn test_to_char() {
        assert_eq!(to_char(b'a'), 'a');
        assert_eq!(to_char(0xff), '\0');
        assert_eq!(normalize(CR), LF);
        assert_eq!(normalize(b';'), b';');
    }
}

use snafu::Snafu;

/// Errors reported to the host through the last-error code.
///
/// All of them are local to one command: the parser always recovers and
/// waits for the next command.
#[derive(Debug, Snafu, Copy, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The command name isn't in the command table.
    #[snafu(display("Unknown command"))]
    BadCommand,
    /// An argument doesn't follow the grammar of its command.
    #[snafu(display("Invalid argument"))]
    BadArgument,
    /// A line mode command expected a delimiter before the next field.
    #[snafu(display("Expected delimiter"))]
    ExpectedDelimiter,
    /// The argument is well formed but outside the allowed range.
    #[snafu(display("Value out of range"))]
    OutOfRange,
}

impl Error {
    /// Numeric code reported by the `GERR` command.
    pub const fn code(self) -> i32 {
        match self {
            Error::BadCommand => 1,
            Error::BadArgument => 2,
            Error::ExpectedDelimiter => 3,
            Error::OutOfRange => 4,
        }
    }

    /// Reverse of [`Error::code`]. Returns `None` for 0 and unknown codes.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Error::BadCommand),
            2 => Some(Error::BadArgument),
            3 => Some(Error::ExpectedDelimiter),
            4 => Some(Error::OutOfRange),
            _ => None,
        }
    }
}

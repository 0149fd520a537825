//! Error types for the DRTP protocol.
//!
//! This module defines all possible errors that can occur while running
//! the handshake, the Go-Back-N transfer, or the file framer.

use std::fmt;
use std::io;

/// Result type alias for DRTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the DRTP protocol.
#[derive(Debug)]
pub enum Error {
    /// Underlying socket or file I/O failed.
    Io(io::Error),

    /// A read timed out where the caller treats that as fatal
    /// (the receiver's long guard timeout).
    Timeout,

    /// A header could not be decoded because the buffer was the wrong
    /// length.
    MalformedHeader,

    /// The handshake or teardown saw a flag combination or sequence
    /// number it did not expect.
    HandshakeMismatch(&'static str),

    /// The file name does not fit in `MAX_FILENAME_LENGTH` bytes.
    FilenameTooLong,

    /// An operation was attempted in a state that does not allow it
    /// (e.g. sending before the handshake completed).
    InvalidState,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Timeout => write!(f, "timed out waiting for peer"),
            Error::MalformedHeader => write!(f, "malformed DRTP header"),
            Error::HandshakeMismatch(what) => write!(f, "handshake failed: {what}"),
            Error::FilenameTooLong => {
                write!(f, "file name does not fit in the header's name field")
            }
            Error::InvalidState => write!(f, "invalid state for this operation"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

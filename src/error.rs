//! Library error types.
//!
use std::fmt;
use std::string::FromUtf8Error;

use crate::MAX_TAG_NAME_LEN;

/// A bflat Result, normally returning a bflat [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A bflat error. Encompasses any issue that can happen while encoding or
/// decoding a document.
///
/// Failures are terminal for the call that produced them: neither `encode`
/// nor `decode` returns partial output.
#[derive(Clone, Debug)]
pub enum Error {
    /// Input ended in the middle of a record: inside a tag name, a LEB128
    /// value, a length-prefixed byte string, or an array payload.
    Truncated {
        /// What step of the decoding we were on when it failed.
        step: &'static str,
        /// The number of bytes remaining in the input
        actual: usize,
        /// The number of bytes the step needed
        expected: usize,
    },
    /// The tag byte carried a type code (or array/type combination) that is
    /// not defined by the format.
    UnknownType {
        /// The offending tag byte
        tag: u8,
    },
    /// A LEB128 value ran past 10 bytes, or does not fit a signed 64-bit
    /// integer.
    Overflow {
        /// What step of the decoding we were on when it failed.
        step: &'static str,
    },
    /// A sequence handed to the encoder mixed element types, or contained an
    /// element with no array form (null, nested sequence).
    HeterogeneousArray {
        /// Element type established by the first element
        expected: &'static str,
        /// Element type that broke the run
        found: &'static str,
    },
    /// A tag name was longer than the format can represent.
    KeyTooLong {
        /// The tag name's actual length
        actual: usize,
    },
    /// A String record (or string array element) held bytes that are not
    /// valid UTF-8.
    InvalidUtf8(FromUtf8Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Truncated {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Input truncated: needed {} more bytes, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::UnknownType { tag } => write!(
                f,
                "Tag byte 0x{:02x} has undefined type code {}{}",
                tag,
                (tag >> 3) & 0x0f,
                if tag & 0x80 != 0 { " (array)" } else { "" }
            ),
            Error::Overflow { step } => write!(
                f,
                "LEB128 value exceeds signed 64-bit range on step [{}]",
                step
            ),
            Error::HeterogeneousArray { expected, found } => write!(
                f,
                "Array elements must share one scalar type: expected {}, found {}",
                expected, found
            ),
            Error::KeyTooLong { actual } => write!(
                f,
                "Tag name too long: was {} bytes, maximum allowed is {}",
                actual, MAX_TAG_NAME_LEN
            ),
            Error::InvalidUtf8(_) => write!(f, "String record is not valid UTF-8"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::InvalidUtf8(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<FromUtf8Error> for Error {
    fn from(e: FromUtf8Error) -> Self {
        Self::InvalidUtf8(e)
    }
}

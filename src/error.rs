use std::fmt;

/// Errors raised while building or querying an index.
///
/// A query that has no occurrence is not an error; searches report it as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A supplied suffix array does not have one entry per text byte.
    SizeMismatch { text: usize, table: usize },
    /// A compressed block was asked for a value past its end.
    DecodeExhausted { index: usize, len: usize },
    /// The suffix array is not a sorted permutation of the text offsets.
    InvalidSuffixArray { rank: usize },
    /// The text does not end in a unique byte smaller than every other byte.
    InvalidSentinel,
    /// A sampling or block step was zero.
    InvalidStep { name: &'static str, value: usize },
    /// A deserialized index is internally inconsistent.
    CorruptIndex { reason: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SizeMismatch { text, table } => write!(
                f,
                "suffix array has {} entries but the text has {} bytes",
                table, text
            ),
            Error::DecodeExhausted { index, len } => write!(
                f,
                "compressed block exhausted: index {} requested from a block of {} values",
                index, len
            ),
            Error::InvalidSuffixArray { rank } => {
                write!(f, "suffix array is not sorted or not a permutation at rank {}", rank)
            }
            Error::InvalidSentinel => {
                write!(f, "text must end with a unique sentinel smaller than every other byte")
            }
            Error::InvalidStep { name, value } => {
                write!(f, "{} must be at least 1 (got {})", name, value)
            }
            Error::CorruptIndex { reason } => write!(f, "corrupt psi index: {}", reason),
        }
    }
}

impl std::error::Error for Error {}

use thiserror::Error;

/// Failures of [`BitBuffer`](crate::BitBuffer) operations and of untyped
/// [invocations](crate::invoke).
///
/// Every operation validates its input before writing, so an error never leaves a buffer
/// partially modified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BitBufferError {
    #[error("Must provide {0}")]
    MissingArgument(&'static str),
    #[error("{0} must be a number")]
    NotANumber(&'static str),
    #[error("{0} must be passed as an array")]
    NotAnArray(&'static str),
    #[error("Number of bits ({bits}) and number of values ({values}) do not match")]
    BitCountMismatch { bits: usize, values: usize },
    #[error("Number of values ({values}) does not match byte range of length {range_len}")]
    ByteRangeMismatch { values: usize, range_len: usize },
    #[error("Byte values must be numbers in 0..=255")]
    NotByteValues,
    #[error("Bit index {index} is out-of-bounds for a buffer of {bit_len} bits")]
    BitOutOfBounds { index: usize, bit_len: usize },
    #[error("Byte index {index} is out-of-bounds for a buffer of {len} bytes")]
    ByteOutOfBounds { index: usize, len: usize },
    #[error("End byte ({end}) must be greater-than or equal to start byte ({start})")]
    InvertedRange { start: usize, end: usize },
    #[error("Expected checksum {expected:#04x} but found {found:#04x}")]
    ChecksumMismatch { expected: u8, found: u8 },
    #[error("copy only takes BitBuffers")]
    InvalidCopySource,
    #[error("Unable to parse buffer from hex")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Unknown operation {0:?}")]
    UnknownOperation(String),
}

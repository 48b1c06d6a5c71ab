//! Byte positions of the password record.
use std::ops::RangeInclusive;

/// Length of a freshly created buffer.
pub const BUFFER_LEN: usize = 20;
/// Number of meaningful bytes, i.e. the payload and the checksum byte.
pub const PASSWORD_LEN: usize = 18;

/// Bytes that are rotated as one 128 bit value.
pub const WINDOW: RangeInclusive<usize> = 0..=15;
pub const WINDOW_LEN: usize = 16;
/// Number of single bit rotations applied to the window.
pub const COUNTER_BYTE: usize = 16;

/// Bytes summed into the checksum.
pub const CHECKSUM_RANGE: RangeInclusive<usize> = 6..=16;
pub const CHECKSUM_BYTE: usize = 17;

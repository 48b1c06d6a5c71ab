//! # narpassword
//!
//! Bit-level access to the fixed-size record behind a Metroid password.
//!
//! The central type is [`BitBuffer`]. It exposes
//! - single bit and bit list reads and writes ([`BitBuffer::get_bit`], [`BitBuffer::set_bits`], ...)
//! - inclusive byte range views ([`BitBuffer::get_bytes`], [`BitBuffer::set_bytes`])
//! - the additive [checksum](`BitBuffer::fix_checksum`) stored in the last password byte
//! - circular rotation of the 16 byte [window](`layout::WINDOW`) with its shift counter
//!
//! Untyped input (e.g. JSON scripts) is applied through the [`invoke`] module, which performs the
//! argument checks that the typed API makes unnecessary.

pub use bit_buffer::BitBuffer;
pub use errors::BitBufferError;
pub use window::Window;

pub mod bit_buffer;
pub mod errors;
pub mod invoke;
pub mod layout;
#[cfg(feature = "_integration_tests")]
#[doc(hidden)]
/// Do **not** use items from this module. They are intended for integration tests and must
/// therefore be public.
pub mod private_test_utils;
pub mod window;

//! 128 bit rotation window
use crate::layout::WINDOW_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The 16 window bytes of a password as one 128 bit value.
///
/// Byte 0 of the window is the most significant byte, so rotating the value moves the most
/// significant bit of byte 0 into the least significant bit of byte 15 and vice versa.
#[derive(Default, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct Window {
    data: u128,
}

impl Window {
    /// Convert bytes in big-endian order into a window.
    pub fn from_be_bytes(bytes: [u8; WINDOW_LEN]) -> Self {
        Self {
            data: u128::from_be_bytes(bytes),
        }
    }

    /// Convert the window to bytes in big-endian order.
    pub fn to_be_bytes(self) -> [u8; WINDOW_LEN] {
        self.data.to_be_bytes()
    }

    /// Circular shift towards byte 0. Bits leaving byte 0 re-enter at byte 15.
    #[must_use]
    pub fn rotate_left(self, n: u32) -> Self {
        Self {
            data: self.data.rotate_left(n),
        }
    }

    /// Circular shift towards byte 15. Bits leaving byte 15 re-enter at byte 0.
    #[must_use]
    pub fn rotate_right(self, n: u32) -> Self {
        Self {
            data: self.data.rotate_right(n),
        }
    }

    pub fn count_ones(&self) -> u32 {
        self.data.count_ones()
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Window({:032x})", self.data)
    }
}

impl From<u128> for Window {
    fn from(val: u128) -> Self {
        Self { data: val }
    }
}

impl From<Window> for u128 {
    fn from(window: Window) -> Self {
        window.data
    }
}

#[cfg(test)]
mod tests {
    use super::Window;

    #[test]
    fn byte_order() {
        let mut bytes = [0; 16];
        bytes[0] = 0x80;
        bytes[15] = 0x01;
        let window = Window::from_be_bytes(bytes);
        assert_eq!(u128::from(window), (1 << 127) | 1);
        assert_eq!(window.to_be_bytes(), bytes);
        assert_eq!(format!("{window:?}"), format!("Window(80{}01)", "0".repeat(28)));
    }

    #[test]
    fn rotation_wraps_across_whole_window() {
        let msb = Window::from(1 << 127);
        assert_eq!(msb.rotate_left(1), Window::from(1));
        assert_eq!(Window::from(1).rotate_right(1), msb);
        let mixed = Window::from(0x0123_4567_89ab_cdef_fedc_ba98_7654_3210);
        assert_eq!(mixed.rotate_left(128), mixed);
        assert_eq!(mixed.rotate_left(13).rotate_right(13), mixed);
        assert_eq!(mixed.rotate_left(13).count_ones(), mixed.count_ones());
    }
}

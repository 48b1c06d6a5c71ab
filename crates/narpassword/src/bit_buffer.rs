//! Fixed-size bit addressable buffer.
use crate::errors::BitBufferError;
use crate::layout::{
    BUFFER_LEN, CHECKSUM_BYTE, CHECKSUM_RANGE, COUNTER_BYTE, WINDOW, WINDOW_LEN,
};
use crate::window::Window;
use bitvec::order::Lsb0;
use bitvec::view::BitView;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// A byte buffer with bit level access.
///
/// Bit `i` is bit `i % 8` of byte `i / 8`, where bit 0 is the least significant bit of a byte.
///
/// The storage `S` decides who owns the bytes. `BitBuffer<Vec<u8>>` (the default) owns its
/// storage, while [`BitBuffer::view`] wraps caller owned bytes so that writes through the buffer
/// are observable by the owner. [`BitBuffer::copy`] always produces an owned, independent buffer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitBuffer<S = Vec<u8>> {
    storage: S,
}

impl BitBuffer<Vec<u8>> {
    /// Adopt `bytes` as the backing storage.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { storage: bytes }
    }

    /// Buffer of [`BUFFER_LEN`] zero bytes.
    pub fn empty() -> Self {
        Self::new(vec![0; BUFFER_LEN])
    }

    /// Deep copy of `source`. Mutating the copy never affects `source` and vice versa.
    pub fn copy<T: AsRef<[u8]>>(source: &BitBuffer<T>) -> Self {
        Self::new(source.as_bytes().to_vec())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.storage
    }
}

impl<'a> BitBuffer<&'a mut [u8]> {
    /// Buffer writing directly into `bytes`.
    pub fn view(bytes: &'a mut [u8]) -> Self {
        Self { storage: bytes }
    }
}

impl Default for BitBuffer<Vec<u8>> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: AsRef<[u8]>> BitBuffer<S> {
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_ref()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of addressable bits.
    pub fn bit_len(&self) -> usize {
        self.len() * 8
    }

    pub fn get_bit(&self, index: usize) -> Result<bool, BitBufferError> {
        self.check_bit(index)?;
        Ok(self.as_bytes().view_bits::<Lsb0>()[index])
    }

    /// Reads the bits at `indices`. The result has the order of `indices`.
    pub fn get_bits(&self, indices: &[usize]) -> Result<Vec<bool>, BitBufferError> {
        indices.iter().map(|&index| self.get_bit(index)).collect()
    }

    pub fn get_byte(&self, index: usize) -> Result<u8, BitBufferError> {
        self.check_byte(index)?;
        Ok(self.as_bytes()[index])
    }

    /// Bytes `start..=end`.
    pub fn get_bytes(&self, start: usize, end: usize) -> Result<&[u8], BitBufferError> {
        self.check_byte_range(start, end)?;
        Ok(&self.as_bytes()[start..=end])
    }

    /// Sum of the checksummed bytes, wrapping at 256.
    pub fn checksum(&self) -> Result<u8, BitBufferError> {
        self.check_byte(CHECKSUM_BYTE)?;
        Ok(self.as_bytes()[CHECKSUM_RANGE]
            .iter()
            .fold(0_u8, |sum, &byte| sum.wrapping_add(byte)))
    }

    pub fn validate_checksum(&self) -> Result<(), BitBufferError> {
        let expected = self.checksum()?;
        let found = self.as_bytes()[CHECKSUM_BYTE];
        if expected != found {
            debug!(expected, found, "Checksum mismatch");
            return Err(BitBufferError::ChecksumMismatch { expected, found });
        }
        Ok(())
    }

    /// The rotation window as a single value.
    pub fn window(&self) -> Result<Window, BitBufferError> {
        // the counter byte directly follows the window
        self.check_byte(COUNTER_BYTE)?;
        let mut bytes = [0; WINDOW_LEN];
        bytes.copy_from_slice(&self.as_bytes()[WINDOW]);
        Ok(Window::from_be_bytes(bytes))
    }

    pub fn counter(&self) -> Result<u8, BitBufferError> {
        self.get_byte(COUNTER_BYTE)
    }

    fn check_bit(&self, index: usize) -> Result<(), BitBufferError> {
        let bit_len = self.bit_len();
        if index >= bit_len {
            return Err(BitBufferError::BitOutOfBounds { index, bit_len });
        }
        Ok(())
    }

    fn check_byte(&self, index: usize) -> Result<(), BitBufferError> {
        let len = self.len();
        if index >= len {
            return Err(BitBufferError::ByteOutOfBounds { index, len });
        }
        Ok(())
    }

    fn check_byte_range(&self, start: usize, end: usize) -> Result<(), BitBufferError> {
        self.check_byte(start)?;
        self.check_byte(end)?;
        if start > end {
            return Err(BitBufferError::InvertedRange { start, end });
        }
        Ok(())
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> BitBuffer<S> {
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.storage.as_mut()
    }

    /// Sets the bit at `index` to `value`. The other bits of the byte are unchanged.
    pub fn set_bit(&mut self, index: usize, value: bool) -> Result<(), BitBufferError> {
        self.check_bit(index)?;
        self.as_bytes_mut().view_bits_mut::<Lsb0>().set(index, value);
        Ok(())
    }

    /// Writes `values[i]` to bit `indices[i]`, in order. For repeated indices the last value
    /// wins. Nothing is written if any index is out-of-bounds.
    pub fn set_bits(&mut self, indices: &[usize], values: &[bool]) -> Result<(), BitBufferError> {
        if indices.len() != values.len() {
            return Err(BitBufferError::BitCountMismatch {
                bits: indices.len(),
                values: values.len(),
            });
        }
        indices.iter().try_for_each(|&index| self.check_bit(index))?;
        let bits = self.as_bytes_mut().view_bits_mut::<Lsb0>();
        for (&index, &value) in indices.iter().zip(values) {
            bits.set(index, value);
        }
        Ok(())
    }

    pub fn set_byte(&mut self, index: usize, value: u8) -> Result<(), BitBufferError> {
        self.check_byte(index)?;
        self.as_bytes_mut()[index] = value;
        Ok(())
    }

    /// Writes `values` to bytes `start..=end`.
    pub fn set_bytes(&mut self, start: usize, end: usize, values: &[u8]) -> Result<(), BitBufferError> {
        self.check_byte_range(start, end)?;
        let range_len = end - start + 1;
        if values.len() != range_len {
            return Err(BitBufferError::ByteRangeMismatch {
                values: values.len(),
                range_len,
            });
        }
        trace!(start, end, "Writing bytes");
        self.as_bytes_mut()[start..=end].copy_from_slice(values);
        Ok(())
    }

    /// Stores the correct checksum. Calling this on a buffer with a valid checksum changes
    /// nothing.
    pub fn fix_checksum(&mut self) -> Result<(), BitBufferError> {
        let checksum = self.checksum()?;
        debug!(checksum, "Fixing checksum");
        self.as_bytes_mut()[CHECKSUM_BYTE] = checksum;
        Ok(())
    }

    /// Rotates the window left by one bit and increments the counter.
    pub fn rotate_left(&mut self) -> Result<(), BitBufferError> {
        let window = self.window()?.rotate_left(1);
        self.store_window(window);
        self.add_to_counter(1);
        Ok(())
    }

    /// Rotates the window right by one bit and decrements the counter.
    pub fn rotate_right(&mut self) -> Result<(), BitBufferError> {
        let window = self.window()?.rotate_right(1);
        self.store_window(window);
        self.add_to_counter(u8::MAX);
        Ok(())
    }

    /// Rotates the window left by as many bits as the counter holds. The counter is unchanged.
    pub fn rotate_left_by_counter(&mut self) -> Result<(), BitBufferError> {
        let window = self.window()?;
        let shift = self.as_bytes()[COUNTER_BYTE];
        self.store_window(window.rotate_left(shift.into()));
        Ok(())
    }

    /// Inverse of [`rotate_left_by_counter`](Self::rotate_left_by_counter).
    pub fn rotate_right_by_counter(&mut self) -> Result<(), BitBufferError> {
        let window = self.window()?;
        let shift = self.as_bytes()[COUNTER_BYTE];
        self.store_window(window.rotate_right(shift.into()));
        Ok(())
    }

    fn store_window(&mut self, window: Window) {
        trace!(?window, "Storing rotated window");
        self.as_bytes_mut()[WINDOW].copy_from_slice(&window.to_be_bytes());
    }

    fn add_to_counter(&mut self, delta: u8) {
        let counter = &mut self.as_bytes_mut()[COUNTER_BYTE];
        *counter = counter.wrapping_add(delta);
    }
}

impl<S: AsRef<[u8]>> fmt::Display for BitBuffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_bytes()))
    }
}

impl<S: AsRef<[u8]>> fmt::Debug for BitBuffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitBuffer({self})")
    }
}

impl FromStr for BitBuffer<Vec<u8>> {
    type Err = BitBufferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(hex::decode(s.trim())?))
    }
}

impl From<Vec<u8>> for BitBuffer<Vec<u8>> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

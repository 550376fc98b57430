use crate::error::{decode_error, Result};
use byteorder::{BigEndian, ByteOrder};
use snafu::ensure;

/// Bounds-checked big-endian reader over a complete resource.
///
/// Every read advances the position by the width of the value read. A read that would run past
/// the end of the buffer fails with [`DecodeError::OutOfRange`](crate::DecodeError::OutOfRange)
/// and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub const fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Borrows the next `n` bytes and moves past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.position.checked_add(n);
        ensure!(
            end.map_or(false, |end| end <= self.data.len()),
            decode_error::OutOfRangeSnafu {
                position: self.position,
                width: n,
                len: self.data.len(),
            }
        );

        let bytes = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(bytes)
    }

    /// Moves past `n` bytes without looking at them.
    #[inline]
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(BigEndian::read_u16)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(BigEndian::read_u32)
    }

    /// Reads a 16.16 fixed-point number and returns its integer part.
    ///
    /// The fraction is truncated, not rounded.
    #[inline]
    pub fn read_fixed_point(&mut self) -> Result<u32> {
        self.read_u32().map(|fixed| fixed >> 16)
    }

    /// Advances to the next even offset if the position is odd.
    pub fn align_to_word(&mut self) -> Result<()> {
        if self.position % 2 == 1 {
            self.skip(1)?;
        }
        Ok(())
    }
}

//! QuickDraw records shared by the resource decoders.
//!
//! Each reader is a fixed sequence of big-endian primitive reads; field order on the wire is the
//! declaration order of the struct it fills in.

use crate::{
    cursor::ByteCursor,
    error::{format_error, Result},
};
use snafu::OptionExt;

/// `rowBytes` carries flag bits at the top that are not part of the stride.
pub const ROW_BYTES_MASK: u16 = 0x7FFF;

/// A QuickDraw rectangle, stored as `top, left, bottom, right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub top: u16,
    pub left: u16,
    pub bottom: u16,
    pub right: u16,
}

impl Rect {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            top: cursor.read_u16()?,
            left: cursor.read_u16()?,
            bottom: cursor.read_u16()?,
            right: cursor.read_u16()?,
        })
    }

    pub fn width(&self) -> Result<u16> {
        extent(self.left, self.right)
    }

    pub fn height(&self) -> Result<u16> {
        extent(self.top, self.bottom)
    }
}

/// `high - low`, refusing to wrap around.
pub(crate) fn extent(low: u16, high: u16) -> Result<u16> {
    Ok(high
        .checked_sub(low)
        .context(format_error::NegativeExtentSnafu { low, high })?)
}

/// A rectangle re-expressed as origin plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Region {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Rect::read(cursor)?.try_into()
    }

    #[inline]
    pub fn area(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

impl TryFrom<Rect> for Region {
    type Error = crate::DecodeError;

    fn try_from(rect: Rect) -> Result<Self> {
        Ok(Self {
            x: rect.left,
            y: rect.top,
            width: rect.width()?,
            height: rect.height()?,
        })
    }
}

/// Header of a color pixel map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixMap {
    pub base_address: u32,
    /// Scanline stride with the flag bits already masked off.
    pub row_bytes: u16,
    pub bounds: Region,
    pub version: u16,
    pub pack_type: u16,
    pub pack_size: u32,
    pub h_res: u32,
    pub v_res: u32,
    pub pixel_type: u16,
    pub pixel_size: u16,
    pub component_count: u16,
    pub component_size: u16,
    pub plane_bytes: u32,
    pub color_table: u32,
    pub reserved: u32,
}

impl PixMap {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            base_address: cursor.read_u32()?,
            row_bytes: cursor.read_u16()? & ROW_BYTES_MASK,
            bounds: Region::read(cursor)?,
            version: cursor.read_u16()?,
            pack_type: cursor.read_u16()?,
            pack_size: cursor.read_u32()?,
            h_res: cursor.read_fixed_point()?,
            v_res: cursor.read_fixed_point()?,
            pixel_type: cursor.read_u16()?,
            pixel_size: cursor.read_u16()?,
            component_count: cursor.read_u16()?,
            component_size: cursor.read_u16()?,
            plane_bytes: cursor.read_u32()?,
            color_table: cursor.read_u32()?,
            reserved: cursor.read_u32()?,
        })
    }

    /// Size in bytes of the uncompressed pixel data that follows the header.
    pub fn data_len(&self) -> usize {
        usize::from(self.row_bytes) * usize::from(self.bounds.height)
    }
}

/// Header of a 1-bit bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMap {
    pub base_address: u32,
    pub row_bytes: u16,
    pub bounds: Region,
}

impl BitMap {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            base_address: cursor.read_u32()?,
            row_bytes: cursor.read_u16()? & ROW_BYTES_MASK,
            bounds: Region::read(cursor)?,
        })
    }

    pub fn data_len(&self) -> usize {
        usize::from(self.row_bytes) * usize::from(self.bounds.height)
    }
}

/// One palette entry. `value` is the pixel value it answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSpec {
    pub value: u16,
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl ColorSpec {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            value: cursor.read_u16()?,
            r: cursor.read_u16()?,
            g: cursor.read_u16()?,
            b: cursor.read_u16()?,
        })
    }

    /// The channels narrowed to 8 bits (low byte of each 16-bit channel).
    #[inline]
    pub fn rgb8(&self) -> [u8; 3] {
        [self.r as u8, self.g as u8, self.b as u8]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    pub seed: u32,
    pub flags: u16,
    pub entries: Vec<ColorSpec>,
}

impl ColorTable {
    /// Reads the table header and its entries. The stored size is one less than the entry count.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let seed = cursor.read_u32()?;
        let flags = cursor.read_u16()?;
        let count = usize::from(cursor.read_u16()?) + 1;

        let entries = (0..count)
            .map(|_| ColorSpec::read(cursor))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            seed,
            flags,
            entries,
        })
    }

    /// First entry whose `value` matches. Tables need not be sorted or unique.
    pub fn lookup(&self, value: u16) -> Option<&ColorSpec> {
        self.entries.iter().find(|entry| entry.value == value)
    }
}

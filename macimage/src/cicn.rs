//! `cicn` color icons.
//!
//! ```plain
//! PixMap      color pixel map header
//! BitMap      mask header
//! BitMap      1-bit icon header
//! u32         icon data handle, always 0
//! [u8]        mask rows      (mask.rowBytes * mask.height)
//! [u8]        1-bit rows     (icon.rowBytes * icon.height), unused
//! ColorTable
//! [u8]        pixel rows     (pixMap.rowBytes * pixMap.height)
//! ```

use crate::{
    cursor::ByteCursor,
    error::{format_error, Result},
    records::{BitMap, ColorTable, PixMap},
    utils::{new_image, rgba},
};
use image::RgbaImage;
use itertools::iproduct;
use log::debug;
use snafu::{ensure, OptionExt};

/// Index arithmetic masks `rowBytes` down to its 14 stride bits.
const INDEX_ROW_BYTES_MASK: u16 = 0x3FFF;

/// Everything a `cicn` resource carries, in wire order.
#[derive(Debug, Clone)]
pub struct ColorIcon<'a> {
    pub pix_map: PixMap,
    pub mask: BitMap,
    pub icon: BitMap,
    pub mask_data: &'a [u8],
    pub color_table: ColorTable,
    pub pixel_data: &'a [u8],
}

impl<'a> ColorIcon<'a> {
    pub fn read(data: &'a [u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);

        let pix_map = PixMap::read(&mut cursor)?;
        let mask = BitMap::read(&mut cursor)?;
        let icon = BitMap::read(&mut cursor)?;
        let _handle = cursor.read_u32()?;

        let mask_data = cursor.read_bytes(mask.data_len())?;
        cursor.skip(icon.data_len())?;
        let color_table = ColorTable::read(&mut cursor)?;
        let pixel_data = cursor.read_bytes(pix_map.data_len())?;

        debug!(
            "color icon {}x{} @ {}bpp, {} colors",
            pix_map.bounds.width,
            pix_map.bounds.height,
            pix_map.pixel_size,
            color_table.entries.len()
        );

        Ok(Self {
            pix_map,
            mask,
            icon,
            mask_data,
            color_table,
            pixel_data,
        })
    }

    /// Extracts the palette value of the pixel at bit/row index `idx`.
    pub fn pixel_value(&self, idx: usize) -> Result<u16> {
        let data = self.pixel_data;
        let byte = |offset: usize| -> Result<u8> {
            Ok(data.get(offset).copied().context(format_error::TruncatedRowSnafu {
                needed: offset + 1,
                got: data.len(),
            })?)
        };

        let value = match self.pix_map.pixel_size {
            1 => (byte(idx / 8)? >> (7 - idx % 8)) & 0x01,
            2 => (byte(idx / 4)? >> (2 * (3 - idx % 4))) & 0x03,
            4 => {
                let packed = byte(idx / 2)?;
                if idx % 2 == 1 {
                    packed & 0x0F
                } else {
                    packed >> 4
                }
            }
            8 => byte(idx)?,
            pixel_size => {
                return Err(format_error::UnhandledPixelSizeSnafu { pixel_size }
                    .build()
                    .into())
            }
        };

        Ok(u16::from(value))
    }

    /// Mask alpha at bit/row index `idx`: 0 or 255.
    fn alpha(&self, idx: usize) -> Result<u8> {
        let byte = self
            .mask_data
            .get(idx / 8)
            .copied()
            .context(format_error::TruncatedRowSnafu {
                needed: idx / 8 + 1,
                got: self.mask_data.len(),
            })?;
        Ok(((byte >> (7 - idx % 8)) & 0x01) * 255)
    }

    /// Renders the icon through its color table, with alpha from the mask.
    ///
    /// Pixels whose value has no color table entry stay fully transparent.
    pub fn to_rgba(&self) -> Result<RgbaImage> {
        let pixel_size = self.pix_map.pixel_size;
        ensure!(
            matches!(pixel_size, 1 | 2 | 4 | 8),
            format_error::UnhandledPixelSizeSnafu { pixel_size }
        );

        let bounds = self.pix_map.bounds;
        let row_bytes = usize::from(self.pix_map.row_bytes & INDEX_ROW_BYTES_MASK);
        let pixels_per_row = row_bytes * 8 / usize::from(pixel_size);

        let mut image = new_image(u32::from(bounds.width), u32::from(bounds.height))?;
        for (y, x) in iproduct!(0..bounds.height, 0..bounds.width) {
            let idx = usize::from(y) * pixels_per_row + usize::from(x);

            let value = self.pixel_value(idx)?;
            if let Some(color) = self.color_table.lookup(value) {
                let [r, g, b] = color.rgb8();
                let a = self.alpha(idx)?;
                image.put_pixel(u32::from(x), u32::from(y), rgba([r, g, b, a]));
            }
        }

        Ok(image)
    }
}

/// Decodes a complete `cicn` resource into an RGBA image the size of its pixel map.
pub fn decode_color_icon(data: &[u8]) -> Result<RgbaImage> {
    ColorIcon::read(data)?.to_rgba()
}

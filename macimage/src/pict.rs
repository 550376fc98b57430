//! Version 2 `PICT` pictures.
//!
//! Only the subset of QuickDraw opcodes found in pictures that wrap a single direct-color pixel
//! block is understood. Anything else fails with
//! [`FormatError::UnhandledOpcode`](crate::FormatError::UnhandledOpcode).
//!
//! # Layout
//!
//! ```plain
//! u16       reserved (picture size, unused)
//! Rect      frame
//! u32       version tag, 0x001102FF
//! u16       opcode 0x0C00 (extended header)
//! u32       header version
//!           high half 0xFFFE: 2 * u32 reserved, Rect resolution
//!           otherwise:        4 * Fixed y, x, w, h
//! ...       opcodes, each aligned to an even offset, until 0x00FF
//! ```

use crate::{
    cursor::ByteCursor,
    error::{format_error, Result},
    packbits::unpack_bits,
    records::{extent, PixMap, Rect, Region},
    utils::{argb32_to_rgba, new_image, rgb555_to_rgba, rgba},
    FormatError,
};
use image::RgbaImage;
use log::{debug, trace};
use snafu::{ensure, OptionExt};

pub const PICT_VERSION_2: u32 = 0x0011_02FF;
pub const EXTENDED_HEADER_SENTINEL: u32 = 0xFFFE_0000;

/// Pixel maps with fewer row bytes than this are stored without PackBits compression.
pub const MIN_PACKED_ROW_BYTES: u16 = 8;
/// Pixel maps with more row bytes than this prefix each packed row with a 16-bit length.
pub const WIDE_ROW_BYTES: u16 = 250;

pub const PACK_TYPE_RGB555: u16 = 3;
pub const PACK_TYPE_PLANAR: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum PictOpcode {
    Nop = 0x0000,
    ClipRegion = 0x0001,
    DefHiLite = 0x001E,
    DirectBitsRect = 0x009A,
    LongComment = 0x00A1,
    EndOfPicture = 0x00FF,
    ExtHeader = 0x0C00,
}

impl TryFrom<u16> for PictOpcode {
    type Error = FormatError;

    fn try_from(opcode: u16) -> Result<Self, FormatError> {
        Ok(match opcode {
            0x0000 => Self::Nop,
            0x0001 => Self::ClipRegion,
            0x001E => Self::DefHiLite,
            0x009A => Self::DirectBitsRect,
            0x00A1 => Self::LongComment,
            0x00FF => Self::EndOfPicture,
            0x0C00 => Self::ExtHeader,
            _ => return format_error::UnhandledOpcodeSnafu { opcode }.fail(),
        })
    }
}

/// A decoded picture.
#[derive(Debug, Clone)]
pub struct Picture {
    pub frame: Rect,
    /// Device-to-logical scale, applied only to clip regions.
    pub x_ratio: u16,
    pub y_ratio: u16,
    /// The last direct-bits block drawn, if any.
    pub image: Option<RgbaImage>,
}

/// Decodes a complete `PICT` resource into the pixels of its direct-bits block.
///
/// `Ok(None)` means the picture was well formed but never drew any pixels.
pub fn decode_picture(data: &[u8]) -> Result<Option<RgbaImage>> {
    PictDecoder::new(data).decode().map(|picture| picture.image)
}

pub struct PictDecoder<'a> {
    cursor: ByteCursor<'a>,
    x_ratio: u16,
    y_ratio: u16,
}

impl<'a> PictDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            x_ratio: 0,
            y_ratio: 0,
        }
    }

    pub fn decode(mut self) -> Result<Picture> {
        self.cursor.skip(2)?;
        let frame = Rect::read(&mut self.cursor)?;

        let version = self.cursor.read_u32()?;
        ensure!(
            version == PICT_VERSION_2,
            format_error::NotVersion2Snafu { version }
        );

        let opcode = self.read_opcode()?;
        ensure!(
            opcode == PictOpcode::ExtHeader as u16,
            format_error::MissingExtendedHeaderSnafu { opcode }
        );

        self.read_ratio(&frame)?;
        debug!(
            "picture frame {frame:?}, ratio {}x{}",
            self.x_ratio, self.y_ratio
        );

        let mut image = None;
        while !self.cursor.is_at_end() {
            let opcode = PictOpcode::try_from(self.read_opcode()?)?;
            trace!("opcode {opcode:?} at {:#x}", self.cursor.position() - 2);

            match opcode {
                PictOpcode::ClipRegion => {
                    let clip = self.read_clip_region()?;
                    trace!("clip region {clip:?} ignored");
                }
                PictOpcode::DirectBitsRect => image = Some(self.read_direct_bits_rect()?),
                PictOpcode::LongComment => {
                    let _kind = self.cursor.read_u16()?;
                    let len = self.cursor.read_u16()?;
                    self.cursor.skip(usize::from(len))?;
                }
                PictOpcode::EndOfPicture => break,
                PictOpcode::Nop | PictOpcode::ExtHeader | PictOpcode::DefHiLite => {}
            }
        }

        Ok(Picture {
            frame,
            x_ratio: self.x_ratio,
            y_ratio: self.y_ratio,
            image,
        })
    }

    fn read_opcode(&mut self) -> Result<u16> {
        self.cursor.align_to_word()?;
        self.cursor.read_u16()
    }

    fn read_ratio(&mut self, frame: &Rect) -> Result<()> {
        let frame_width = u32::from(frame.width()?);
        let frame_height = u32::from(frame.height()?);

        let header_version = self.cursor.read_u32()?;
        let (x, y) = if header_version & 0xFFFF_0000 == EXTENDED_HEADER_SENTINEL {
            self.cursor.skip(2 * 4)?;
            let resolution = Rect::read(&mut self.cursor)?;
            (
                frame_width.checked_div(resolution.width()?.into()),
                frame_height.checked_div(resolution.height()?.into()),
            )
        } else {
            let y2 = self.cursor.read_fixed_point()?;
            let x2 = self.cursor.read_fixed_point()?;
            let w2 = self.cursor.read_fixed_point()?;
            let h2 = self.cursor.read_fixed_point()?;
            (
                frame_width.checked_div(w2.wrapping_sub(x2)),
                frame_height.checked_div(h2.wrapping_sub(y2)),
            )
        };

        // ratios wider than the 16-bit field are truncated to it
        let (x, y) = (x.unwrap_or(0) as u16, y.unwrap_or(0) as u16);
        ensure!(
            x > 0 && y > 0,
            format_error::InvalidRatioSnafu {
                x: u32::from(x),
                y: u32::from(y)
            }
        );

        self.x_ratio = x;
        self.y_ratio = y;
        Ok(())
    }

    fn read_clip_region(&mut self) -> Result<Region> {
        let size = self.cursor.read_u16()?;
        let x = self.cursor.read_u16()? / self.x_ratio;
        let y = self.cursor.read_u16()? / self.y_ratio;
        let right = self.cursor.read_u16()? / self.x_ratio;
        let bottom = self.cursor.read_u16()? / self.y_ratio;

        let points = size
            .checked_sub(10)
            .context(format_error::RegionTooSmallSnafu { size })?
            / 4;
        self.cursor.skip(usize::from(points) * 4)?;

        Ok(Region {
            x,
            y,
            width: extent(x, right)?,
            height: extent(y, bottom)?,
        })
    }

    fn read_direct_bits_rect(&mut self) -> Result<RgbaImage> {
        let pix_map = PixMap::read(&mut self.cursor)?;
        let source = Region::read(&mut self.cursor)?;
        let destination = Region::read(&mut self.cursor)?;
        // transfer mode
        self.cursor.skip(2)?;

        debug!(
            "direct bits: {}x{} ({} px) @ {}bpp, pack type {}, {} row bytes, {} components",
            source.width,
            source.height,
            source.area(),
            pix_map.pixel_size,
            pix_map.pack_type,
            pix_map.row_bytes,
            pix_map.component_count
        );

        let pack_type = pix_map.pack_type;
        ensure!(
            pack_type == PACK_TYPE_RGB555 || pack_type == PACK_TYPE_PLANAR,
            format_error::UnsupportedPackTypeSnafu { pack_type }
        );

        let width = usize::from(source.width);
        let plane = usize::from(pix_map.bounds.width);
        let row_len = width * 2;

        // grown per row, never sized from the header
        let mut rgb555 = Vec::new();
        let mut argb32 = Vec::new();

        for _ in 0..source.height {
            let unpacked;
            let row = if pix_map.row_bytes < MIN_PACKED_ROW_BYTES {
                self.cursor.read_bytes(usize::from(pix_map.row_bytes))?
            } else {
                let packed_len = if pix_map.row_bytes > WIDE_ROW_BYTES {
                    usize::from(self.cursor.read_u16()?)
                } else {
                    usize::from(self.cursor.read_u8()?)
                };
                let packed = self.cursor.read_bytes(packed_len)?;
                let element_width = if pack_type == PACK_TYPE_RGB555 { 2 } else { 1 };
                unpacked = unpack_bits(packed, element_width)?;
                &unpacked[..]
            };

            let row = row.get(..row_len).context(format_error::TruncatedRowSnafu {
                needed: row_len,
                got: row.len(),
            })?;

            if pack_type == PACK_TYPE_RGB555 {
                rgb555.extend(
                    row.chunks_exact(2)
                        .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
                );
            } else if pix_map.component_count == 3 {
                for i in 0..width {
                    let r = plane_byte(row, i)?;
                    let g = plane_byte(row, plane + i)?;
                    // the blue plane may lie past the retained row; it reads as zero
                    let b = row.get(2 * plane + i).copied().unwrap_or(0);
                    argb32.push(u32::from_be_bytes([0xFF, r, g, b]));
                }
            } else {
                for i in 0..width {
                    argb32.push(u32::from_be_bytes([
                        plane_byte(row, i)?,
                        plane_byte(row, plane + i)?,
                        plane_byte(row, 2 * plane + i)?,
                        plane_byte(row, 3 * plane + i)?,
                    ]));
                }
            }
        }

        let out_width = u32::from(destination.width);
        let mut image = new_image(out_width, u32::from(destination.height))?;
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let i = (y * out_width + x) as usize;
            *pixel = if pack_type == PACK_TYPE_RGB555 {
                rgba(rgb555_to_rgba(rgb555.get(i).copied().unwrap_or(0)))
            } else {
                rgba(argb32_to_rgba(argb32.get(i).copied().unwrap_or(0)))
            };
        }

        Ok(image)
    }
}

fn plane_byte(row: &[u8], index: usize) -> Result<u8> {
    Ok(row
        .get(index)
        .copied()
        .context(format_error::TruncatedRowSnafu {
            needed: index + 1,
            got: row.len(),
        })?)
}

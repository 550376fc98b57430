//! `rlëD` run-length encoded sprites.
//!
//! # Header
//!
//! ```plain
//! u16 width
//! u16 height
//! u16 bits per pixel (16)
//! u16 reserved
//! u16 frame count
//! 6 bytes reserved
//! ```
//!
//! # Body
//!
//! A sequence of 32-bit words. The top byte is an [`RleOpcode`], the low 24 bits a byte count.
//! Scanline data is padded so that every word starts on a 4-byte boundary relative to the start
//! of its line.

use crate::{
    cursor::ByteCursor,
    error::{format_error, Result},
    utils::{new_image, rgb555_to_rgba, rgba},
    FormatError,
};
use image::{imageops, RgbaImage};
use log::{debug, trace};
use snafu::ensure;

pub const SUPPORTED_BITS_PER_PIXEL: u16 = 16;

/// Column counts tried, in order, when a sheet layout is picked automatically.
pub const SHEET_COLUMN_CANDIDATES: [u32; 7] = [16, 12, 8, 6, 4, 2, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RleOpcode {
    EndOfFrame = 0,
    LineStart = 1,
    PixelData = 2,
    TransparentRun = 3,
    PixelRun = 4,
}

impl TryFrom<u8> for RleOpcode {
    type Error = FormatError;

    fn try_from(opcode: u8) -> Result<Self, FormatError> {
        Ok(match opcode {
            0 => Self::EndOfFrame,
            1 => Self::LineStart,
            2 => Self::PixelData,
            3 => Self::TransparentRun,
            4 => Self::PixelRun,
            _ => return format_error::InvalidSpriteOpcodeSnafu { opcode }.fail(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteHeader {
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u16,
    pub frame_count: u16,
}

impl SpriteHeader {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let width = cursor.read_u16()?;
        let height = cursor.read_u16()?;
        let bits_per_pixel = cursor.read_u16()?;
        cursor.skip(2)?;
        let frame_count = cursor.read_u16()?;
        cursor.skip(6)?;

        ensure!(
            bits_per_pixel == SUPPORTED_BITS_PER_PIXEL,
            format_error::UnsupportedDepthSnafu { bits_per_pixel }
        );

        Ok(Self {
            width,
            height,
            bits_per_pixel,
            frame_count,
        })
    }
}

/// How frames are arranged on a sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SheetLayout {
    /// Frames per sheet row. Picked from [`SHEET_COLUMN_CANDIDATES`] when `None`.
    pub count_across: Option<u32>,
}

impl SheetLayout {
    pub const fn auto() -> Self {
        Self { count_across: None }
    }

    pub const fn across(count_across: u32) -> Self {
        Self {
            count_across: Some(count_across),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub image: RgbaImage,
    pub count_across: u32,
    pub count_down: u32,
}

#[derive(Debug, Clone)]
pub struct Sprite {
    pub header: SpriteHeader,
    /// `header.frame_count` frames, each `header.width` by `header.height`.
    pub frames: Vec<RgbaImage>,
    pub sheet: Option<SpriteSheet>,
}

/// Decodes every frame of a complete `rlëD` resource.
pub fn decode_sprite(data: &[u8]) -> Result<Sprite> {
    let mut cursor = ByteCursor::new(data);
    let header = SpriteHeader::read(&mut cursor)?;
    debug!(
        "sprite {}x{}, {} frames",
        header.width, header.height, header.frame_count
    );

    let frames = FrameDecoder::new(cursor, header).decode()?;

    Ok(Sprite {
        header,
        frames,
        sheet: None,
    })
}

/// Decodes every frame of a complete `rlëD` resource and lays them out on one sheet.
pub fn decode_sprite_sheet(data: &[u8], layout: SheetLayout) -> Result<Sprite> {
    let mut sprite = decode_sprite(data)?;
    sprite.sheet = Some(stitch(&sprite.frames, layout)?);
    Ok(sprite)
}

/// The first candidate column count that evenly divides `frame_count`.
pub fn auto_count_across(frame_count: usize) -> u32 {
    SHEET_COLUMN_CANDIDATES
        .into_iter()
        .find(|&across| frame_count % across as usize == 0)
        .unwrap_or(1)
}

/// Copies frame `i` into grid cell `(i % across, i / across)` of a new sheet.
///
/// All frames are assumed to be the size of the first.
pub fn stitch(frames: &[RgbaImage], layout: SheetLayout) -> Result<SpriteSheet> {
    let first = frames.first().ok_or(FormatError::EmptySpriteSheet)?;
    let (frame_width, frame_height) = first.dimensions();

    let count_across = layout
        .count_across
        .unwrap_or_else(|| auto_count_across(frames.len()));
    ensure!(
        count_across > 0,
        format_error::SheetTooSmallSnafu {
            across: count_across,
            down: 0u32,
            frames: frames.len()
        }
    );
    let count_down = (frames.len() as u32).div_ceil(count_across);

    let sheet_width = u64::from(frame_width) * u64::from(count_across);
    let sheet_height = u64::from(frame_height) * u64::from(count_down);
    let (Ok(width), Ok(height)) = (u32::try_from(sheet_width), u32::try_from(sheet_height)) else {
        return Err(format_error::SheetTooLargeSnafu {
            width: sheet_width,
            height: sheet_height,
        }
        .build()
        .into());
    };

    let mut image = new_image(width, height)?;
    for (i, frame) in (0u32..).zip(frames) {
        let x = (i % count_across) * frame_width;
        let y = (i / count_across) * frame_height;
        imageops::replace(&mut image, frame, i64::from(x), i64::from(y));
    }

    Ok(SpriteSheet {
        image,
        count_across,
        count_down,
    })
}

struct FrameDecoder<'a> {
    cursor: ByteCursor<'a>,
    header: SpriteHeader,
    frames: Vec<RgbaImage>,
    /// Allocated once the frame's first word has been read.
    frame: Option<RgbaImage>,
    row_start: usize,
    line: i32,
    column: i32,
    /// Last pixel read by a `PixelData` run; `PixelRun` repaints with it.
    pixel: u16,
}

impl<'a> FrameDecoder<'a> {
    fn new(cursor: ByteCursor<'a>, header: SpriteHeader) -> Self {
        Self {
            cursor,
            header,
            frames: Vec::with_capacity(usize::from(header.frame_count)),
            frame: None,
            row_start: 0,
            line: -1,
            column: -1,
            pixel: 0,
        }
    }

    fn decode(mut self) -> Result<Vec<RgbaImage>> {
        let mut count = 0u32;

        loop {
            ensure!(
                !self.cursor.is_at_end(),
                format_error::EarlyEndOfResourceSnafu {
                    decoded: self.frames.len() as u16,
                    expected: self.header.frame_count
                }
            );

            let offset = (self.cursor.position() - self.row_start) & 0x03;
            if self.row_start != 0 && offset != 0 {
                self.cursor.skip(4 - (count & 0x03) as usize)?;
            }

            let word = self.cursor.read_u32()?;
            let opcode = RleOpcode::try_from((word >> 24) as u8)?;
            count = word & 0x00FF_FFFF;
            trace!("{opcode:?} x{count} on line {}", self.line);

            if self.frame.is_none() {
                self.frame = Some(new_image(
                    u32::from(self.header.width),
                    u32::from(self.header.height),
                )?);
            }

            match opcode {
                RleOpcode::EndOfFrame => {
                    let expected = i32::from(self.header.height) - 1;
                    ensure!(
                        self.line == expected,
                        format_error::WrongScanlineCountSnafu {
                            line: self.line,
                            expected
                        }
                    );

                    let frame = self.frame.take();
                    if self.frames.len() < usize::from(self.header.frame_count) {
                        self.frames.extend(frame);
                    }
                    if self.frames.len() >= usize::from(self.header.frame_count) {
                        return Ok(self.frames);
                    }
                    self.line = -1;
                }
                RleOpcode::LineStart => {
                    self.line += 1;
                    self.column = 0;
                    self.row_start = self.cursor.position();
                }
                RleOpcode::PixelData => {
                    for _ in (0..count).step_by(2) {
                        self.pixel = self.cursor.read_u16()?;
                        self.put_pixel();
                    }
                    if count & 0x03 > 0 {
                        self.cursor.skip(4 - (count & 0x03) as usize)?;
                    }
                }
                RleOpcode::TransparentRun => {
                    let shift = (self.header.bits_per_pixel >> 3) - 1;
                    self.column = self.column.saturating_add((count >> shift) as i32);
                }
                RleOpcode::PixelRun => {
                    // the repeated pixel word is consumed but the run repaints with `self.pixel`
                    let _repeated = self.cursor.read_u32()?;
                    for i in (0..count).step_by(4) {
                        self.put_pixel();
                        if i + 2 < count {
                            self.put_pixel();
                        }
                    }
                }
            }
        }
    }

    /// Writes the current pixel at the cursor column and advances it. Positions outside the
    /// frame are dropped.
    fn put_pixel(&mut self) {
        let (x, y) = (self.column, self.line);
        self.column = self.column.saturating_add(1);

        if x < 0 || y < 0 || x >= i32::from(self.header.width) || y >= i32::from(self.header.height)
        {
            return;
        }
        if let Some(frame) = &mut self.frame {
            frame.put_pixel(x as u32, y as u32, rgba(rgb555_to_rgba(self.pixel)));
        }
    }
}

use crate::error::{format_error, Result};
use image::{ImageBuffer, Rgba, RgbaImage};
use snafu::{ensure, OptionExt};

/// Largest pixel buffer a decoder will allocate, matching `image`'s default `max_alloc`.
pub const MAX_IMAGE_BYTES: u64 = 512 * 1024 * 1024;

/// Expands a `0RRRRRGGGGGBBBBB` pixel to 8-bit RGBA.
///
/// Each channel is shifted left by 3 with the low bits left zero. Alpha is always opaque.
#[inline]
pub const fn rgb555_to_rgba(pixel: u16) -> [u8; 4] {
    let r = (pixel >> 10) & 0x1F;
    let g = (pixel >> 5) & 0x1F;
    let b = pixel & 0x1F;

    [(r << 3) as u8, (g << 3) as u8, (b << 3) as u8, 0xFF]
}

/// Splits an `AARRGGBB` word into RGBA channels.
#[inline]
pub const fn argb32_to_rgba(pixel: u32) -> [u8; 4] {
    let [a, r, g, b] = pixel.to_be_bytes();
    [r, g, b, a]
}

#[inline]
pub(crate) const fn rgba(channels: [u8; 4]) -> Rgba<u8> {
    Rgba(channels)
}

/// Allocates a transparent `width` by `height` image without aborting on failure.
///
/// Dimensions come straight from resource headers, so buffers over [`MAX_IMAGE_BYTES`] or that
/// the allocator refuses fail with [`FormatError::ImageTooLarge`](crate::FormatError).
pub fn new_image(width: u32, height: u32) -> Result<RgbaImage> {
    let too_large = format_error::ImageTooLargeSnafu { width, height };
    let bytes = (u64::from(width) * u64::from(height)).saturating_mul(4);
    ensure!(bytes <= MAX_IMAGE_BYTES, too_large);

    let len = usize::try_from(bytes).ok().context(too_large)?;
    let mut buffer = Vec::new();
    if buffer.try_reserve_exact(len).is_err() {
        return Err(too_large.build().into());
    }
    buffer.resize(len, 0);

    Ok(ImageBuffer::from_raw(width, height, buffer).context(too_large)?)
}

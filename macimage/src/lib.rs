//! Decoders for three classic Mac OS image resources.
//!
//! - [`cicn`]: color icons, an indexed pixel map with a 1-bit mask and a color table.
//! - [`pict`]: version 2 `PICT` pictures holding a single direct-color pixel block.
//! - [`rle`]: `rlëD` sprites, 16-bit run-length encoded animation frames.
//!
//! Each entry point takes a complete resource as a byte slice, as read out of a resource fork,
//! and returns either fully decoded [`RgbaImage`](image::RgbaImage)s or exactly one
//! [`DecodeError`]. Truncated or malformed input is reported, never panics.
//!
//! # Common records
//!
//! All integers are big-endian. Rectangles are stored as `top, left, bottom, right` and are
//! turned into an origin plus size on read; a rectangle whose far edge lies before its near edge
//! is rejected. See [`records`] for the pixel map, bitmap and color table layouts.
//!
//! # Pixel formats
//!
//! 16-bit pixels are `0RRRRRGGGGGBBBBB`. Every 5-bit channel is shifted left by 3 to make an 8-bit
//! channel; the low three bits are left zero. 32-bit direct pixels are assembled from separate
//! A, R, G and B planes per scanline.
//!
//! # Example
//!
//! ```no_run
//! let data = std::fs::read("cicn-128.bin")?;
//! let icon = macimage::decode_color_icon(&data)?;
//! println!("{}x{}", icon.width(), icon.height());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cicn;
pub mod cursor;
pub mod error;
pub mod packbits;
pub mod pict;
pub mod records;
pub mod rle;
pub mod utils;

pub use cicn::{decode_color_icon, ColorIcon};
pub use cursor::ByteCursor;
pub use error::{DecodeError, FormatError};
pub use pict::{decode_picture, PictDecoder, Picture};
pub use rle::{decode_sprite, decode_sprite_sheet, SheetLayout, Sprite, SpriteSheet};

/// The kinds of resource this crate can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ColorIcon,
    Picture,
    Sprite,
}

impl ResourceKind {
    /// The four-character resource type the kind is stored under.
    pub const fn os_type(self) -> &'static str {
        match self {
            ResourceKind::ColorIcon => "cicn",
            ResourceKind::Picture => "PICT",
            ResourceKind::Sprite => "rlëD",
        }
    }
}

impl core::str::FromStr for ResourceKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(kind) = (s.eq_ignore_ascii_case("cicn")).then_some(ResourceKind::ColorIcon)
               .or_else(|| (s.eq_ignore_ascii_case("pict")).then_some(ResourceKind::Picture))
               .or_else(|| (s.eq_ignore_ascii_case("rle") || s == "rlëD").then_some(ResourceKind::Sprite))
        else { return Err("expected one of cicn, pict, rle"); };

        Ok(kind)
    }
}

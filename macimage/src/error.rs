use snafu::Snafu;

/// The single failure a decode call reports.
///
/// A decode either returns a complete result or exactly one of these, describing the first
/// contract the input violated. No partially decoded buffer is ever handed out.
#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub(crate)))]
pub enum DecodeError {
    /// A read of `width` bytes at `position` would run past the end of the `len`-byte input.
    #[snafu(display("read of {width} bytes at offset {position} overruns {len}-byte resource"))]
    OutOfRange {
        position: usize,
        width: usize,
        len: usize,
    },

    /// The input is in bounds but does not have the expected shape.
    #[snafu(context(false), display("format mismatch: {source}"))]
    FormatMismatch { source: FormatError },
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(module, visibility(pub(crate)))]
pub enum FormatError {
    #[snafu(display("picture is not version 2 (version tag {version:#010x})"))]
    NotVersion2 { version: u32 },

    #[snafu(display("expected extended header opcode, found {opcode:#06x}"))]
    MissingExtendedHeader { opcode: u16 },

    #[snafu(display("invalid device/logical ratio: [{x}, {y}]"))]
    InvalidRatio { x: u32, y: u32 },

    #[snafu(display("unhandled picture opcode {opcode:#06x}"))]
    UnhandledOpcode { opcode: u16 },

    #[snafu(display("unsupported pack type {pack_type}"))]
    UnsupportedPackType { pack_type: u16 },

    #[snafu(display("unhandled pixel size {pixel_size}"))]
    UnhandledPixelSize { pixel_size: u16 },

    #[snafu(display("rectangle edge {high} lies before {low}"))]
    NegativeExtent { low: u16, high: u16 },

    #[snafu(display("region record of {size} bytes is shorter than its header"))]
    RegionTooSmall { size: u16 },

    #[snafu(display("PackBits element width must be <= 4, got {width}"))]
    ElementTooWide { width: usize },

    #[snafu(display("decompressed scanline holds {got} bytes, {needed} needed"))]
    TruncatedRow { needed: usize, got: usize },

    #[snafu(display("unsupported sprite color depth {bits_per_pixel}"))]
    UnsupportedDepth { bits_per_pixel: u16 },

    #[snafu(display("frame ended on scanline {line}, expected {expected}"))]
    WrongScanlineCount { line: i32, expected: i32 },

    #[snafu(display("invalid sprite opcode {opcode:#04x}"))]
    InvalidSpriteOpcode { opcode: u8 },

    #[snafu(display("sprite resource ended after {decoded} of {expected} frames"))]
    EarlyEndOfResource { decoded: u16, expected: u16 },

    #[snafu(display("cannot lay out a sprite sheet without frames"))]
    EmptySpriteSheet,

    #[snafu(display("{across}x{down} grid cannot hold {frames} frames"))]
    SheetTooSmall { across: u32, down: u32, frames: usize },

    #[snafu(display("{width}x{height} sprite sheet exceeds the addressable image size"))]
    SheetTooLarge { width: u64, height: u64 },

    #[snafu(display("{width}x{height} image cannot be allocated"))]
    ImageTooLarge { width: u32, height: u32 },
}

pub type Result<T, E = DecodeError> = core::result::Result<T, E>;

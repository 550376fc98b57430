#![allow(dead_code)]

use image::RgbaImage;

/// Big-endian resource writer.
#[derive(Default)]
pub struct Writer(pub Vec<u8>);

impl Writer {
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.0.extend_from_slice(v);
        self
    }

    pub fn zeros(&mut self, n: usize) -> &mut Self {
        self.0.resize(self.0.len() + n, 0);
        self
    }

    /// `top, left, bottom, right`
    pub fn rect(&mut self, top: u16, left: u16, bottom: u16, right: u16) -> &mut Self {
        self.u16(top).u16(left).u16(bottom).u16(right)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// PackBits-compresses `data` in `width`-byte elements. Repeats of two or more elements become
/// repeat runs, everything else literal runs.
pub fn pack_bits(data: &[u8], width: usize) -> Vec<u8> {
    assert_eq!(data.len() % width, 0);
    let elements: Vec<&[u8]> = data.chunks_exact(width).collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < elements.len() {
        let repeats = elements[i..]
            .iter()
            .take(128)
            .take_while(|&&e| e == elements[i])
            .count();

        if repeats >= 2 {
            out.push((257 - repeats) as u8);
            out.extend_from_slice(elements[i]);
            i += repeats;
            continue;
        }

        let start = i;
        while i < elements.len() && i - start < 128 {
            if i + 1 < elements.len() && elements[i] == elements[i + 1] {
                break;
            }
            i += 1;
        }
        out.push((i - start - 1) as u8);
        for element in &elements[start..i] {
            out.extend_from_slice(element);
        }
    }

    out
}

pub struct PixMapSpec {
    pub row_bytes: u16,
    pub width: u16,
    pub height: u16,
    pub pack_type: u16,
    pub pixel_size: u16,
    pub component_count: u16,
    pub component_size: u16,
}

pub fn write_pix_map(w: &mut Writer, spec: &PixMapSpec) {
    w.u32(0)
        .u16(spec.row_bytes | 0x8000)
        .rect(0, 0, spec.height, spec.width)
        .u16(0) // version
        .u16(spec.pack_type)
        .u32(0) // pack size
        .u32(72 << 16)
        .u32(72 << 16)
        .u16(if spec.pixel_size > 8 { 16 } else { 0 })
        .u16(spec.pixel_size)
        .u16(spec.component_count)
        .u16(spec.component_size)
        .u32(0)
        .u32(0)
        .u32(0);
}

pub enum PictHeader {
    /// Fixed-point `y, x, w, h` resolution rectangle.
    Standard { x2: u32, y2: u32, w2: u32, h2: u32 },
    /// `0xFFFE` header with a resolution rectangle.
    Extended { width: u16, height: u16 },
}

/// Writes everything up to and including the resolution information.
pub fn pict_prologue(width: u16, height: u16, header: PictHeader) -> Writer {
    let mut w = Writer::default();
    w.u16(0).rect(0, 0, height, width).u32(0x0011_02FF).u16(0x0C00);

    match header {
        PictHeader::Standard { x2, y2, w2, h2 } => {
            w.u32(0xFFFF_FFFF)
                .u32(y2 << 16)
                .u32(x2 << 16)
                .u32(w2 << 16)
                .u32(h2 << 16);
        }
        PictHeader::Extended { width, height } => {
            w.u32(0xFFFE_0000).zeros(8).rect(0, 0, height, width);
        }
    }
    w
}

/// A standard-header prologue whose ratio is 1.
pub fn pict_unit_prologue(width: u16, height: u16) -> Writer {
    pict_prologue(
        width,
        height,
        PictHeader::Standard {
            x2: 0,
            y2: 0,
            w2: u32::from(width),
            h2: u32::from(height),
        },
    )
}

/// Appends a 16-bit DirectBitsRect for `pixels` (row-major RGB555).
pub fn write_rgb555_block(w: &mut Writer, width: u16, height: u16, pixels: &[u16]) {
    assert_eq!(pixels.len(), usize::from(width) * usize::from(height));
    let row_bytes = width * 2;

    align_opcode(w);
    w.u16(0x009A);
    write_pix_map(
        w,
        &PixMapSpec {
            row_bytes,
            width,
            height,
            pack_type: 3,
            pixel_size: 16,
            component_count: 3,
            component_size: 5,
        },
    );
    w.rect(0, 0, height, width).rect(0, 0, height, width).u16(0);

    for row in pixels.chunks(usize::from(width)) {
        let raw: Vec<u8> = row.iter().flat_map(|p| p.to_be_bytes()).collect();
        write_row(w, row_bytes, &raw, 2);
    }
}

/// Appends a planar DirectBitsRect. `planes[row][component]` holds one byte per pixel.
pub fn write_planar_block(w: &mut Writer, width: u16, planes: &[Vec<Vec<u8>>]) {
    let height = planes.len() as u16;
    let component_count = planes[0].len() as u16;
    let row_bytes = width * component_count;

    align_opcode(w);
    w.u16(0x009A);
    write_pix_map(
        w,
        &PixMapSpec {
            row_bytes,
            width,
            height,
            pack_type: 4,
            pixel_size: 32,
            component_count,
            component_size: 8,
        },
    );
    w.rect(0, 0, height, width).rect(0, 0, height, width).u16(0);

    for row in planes {
        let raw: Vec<u8> = row.concat();
        write_row(w, row_bytes, &raw, 1);
    }
}

fn write_row(w: &mut Writer, row_bytes: u16, raw: &[u8], element_width: usize) {
    if row_bytes < 8 {
        w.bytes(raw);
        return;
    }
    let packed = pack_bits(raw, element_width);
    if row_bytes > 250 {
        w.u16(packed.len() as u16);
    } else {
        w.u8(packed.len() as u8);
    }
    w.bytes(&packed);
}

/// Pads to the even offset the next opcode is read from.
pub fn align_opcode(w: &mut Writer) {
    if w.len() % 2 == 1 {
        w.u8(0);
    }
}

pub fn end_picture(w: &mut Writer) {
    align_opcode(w);
    w.u16(0x00FF);
}

pub struct IconSpec<'a> {
    pub width: u16,
    pub height: u16,
    pub pixel_size: u16,
    pub row_bytes: u16,
    pub pixels: &'a [u8],
    pub mask_row_bytes: u16,
    pub mask: &'a [u8],
    /// `(value, r, g, b)` with 16-bit channels.
    pub colors: &'a [(u16, u16, u16, u16)],
}

pub fn color_icon(spec: &IconSpec<'_>) -> Vec<u8> {
    let mut w = Writer::default();
    write_pix_map(
        &mut w,
        &PixMapSpec {
            row_bytes: spec.row_bytes,
            width: spec.width,
            height: spec.height,
            pack_type: 0,
            pixel_size: spec.pixel_size,
            component_count: 1,
            component_size: spec.pixel_size,
        },
    );
    // mask and 1-bit icon headers share the geometry
    for _ in 0..2 {
        w.u32(0)
            .u16(spec.mask_row_bytes)
            .rect(0, 0, spec.height, spec.width);
    }
    w.u32(0);
    w.bytes(spec.mask);
    // 1-bit icon data is never looked at
    w.zeros(usize::from(spec.mask_row_bytes) * usize::from(spec.height));

    w.u32(0).u16(0).u16(spec.colors.len() as u16 - 1);
    for &(value, r, g, b) in spec.colors {
        w.u16(value).u16(r).u16(g).u16(b);
    }
    w.bytes(spec.pixels);
    w.0
}

/// Sprite body builder. Words are `opcode << 24 | count`.
pub struct SpriteWriter(pub Writer);

impl SpriteWriter {
    pub fn new(width: u16, height: u16, frames: u16) -> Self {
        let mut w = Writer::default();
        w.u16(width).u16(height).u16(16).u16(0).u16(frames).zeros(6);
        Self(w)
    }

    fn word(&mut self, opcode: u8, count: u32) -> &mut Self {
        self.0.u32(u32::from(opcode) << 24 | count);
        self
    }

    pub fn line_start(&mut self) -> &mut Self {
        self.word(1, 0)
    }

    pub fn pixels(&mut self, pixels: &[u16]) -> &mut Self {
        let count = pixels.len() as u32 * 2;
        self.word(2, count);
        for &p in pixels {
            self.0.u16(p);
        }
        if count & 3 > 0 {
            self.0.zeros(4 - (count & 3) as usize);
        }
        self
    }

    /// Skips `columns` pixels.
    pub fn transparent(&mut self, columns: u32) -> &mut Self {
        self.word(3, columns * 2)
    }

    pub fn pixel_run(&mut self, count: u32, repeated: u32) -> &mut Self {
        self.word(4, count);
        self.0.u32(repeated);
        self
    }

    pub fn end_frame(&mut self) -> &mut Self {
        self.word(0, 0)
    }

    pub fn raw_word(&mut self, opcode: u8, count: u32) -> &mut Self {
        self.word(opcode, count)
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.0 .0)
    }
}

/// A sprite of `colors.len()` 1x1 frames, frame `i` painted `colors[i]`.
pub fn single_pixel_frames(colors: &[u16]) -> Vec<u8> {
    let mut sprite = SpriteWriter::new(1, 1, colors.len() as u16);
    for &color in colors {
        sprite.line_start().pixels(&[color]).end_frame();
    }
    sprite.finish()
}

/// Compares two images, ignoring pixels that are fully transparent in both.
///
/// Returns every differing coordinate.
pub fn fuzzy_diff(got: &RgbaImage, want: &RgbaImage) -> Vec<(u32, u32)> {
    assert_eq!(got.dimensions(), want.dimensions(), "image sizes differ");

    got.enumerate_pixels()
        .filter_map(|(x, y, g)| {
            let w = want.get_pixel(x, y);
            if g[3] == 0 && w[3] == 0 {
                return None;
            }
            (g != w).then_some((x, y))
        })
        .collect()
}

pub fn rgb555(pixel: u16) -> [u8; 4] {
    macimage::utils::rgb555_to_rgba(pixel)
}

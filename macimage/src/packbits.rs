//! PackBits run expansion over 1, 2 or 4 byte elements.
//!
//! ```plain
//! .- control byte c ---------.
//! | c <  128 : literal run   |  (c + 1) elements follow verbatim
//! | c >= 128 : repeat run    |  one element follows, emitted (257 - c) times
//! `--------------------------`
//! ```

use crate::{
    cursor::ByteCursor,
    error::{format_error, Result},
};
use snafu::ensure;

/// Widest element a run may repeat.
pub const MAX_ELEMENT_WIDTH: usize = 4;

/// Expands `packed` into a fresh buffer, treating runs as `element_width`-byte units.
///
/// Literal and repeat runs that would read past the end of `packed` fail with
/// [`DecodeError::OutOfRange`](crate::DecodeError::OutOfRange).
pub fn unpack_bits(packed: &[u8], element_width: usize) -> Result<Vec<u8>> {
    ensure!(
        element_width <= MAX_ELEMENT_WIDTH,
        format_error::ElementTooWideSnafu {
            width: element_width
        }
    );

    let mut output = Vec::with_capacity(packed.len() * 2);
    let mut cursor = ByteCursor::new(packed);

    while !cursor.is_at_end() {
        let control = cursor.read_u8()?;

        if control < 128 {
            let run = (usize::from(control) + 1) * element_width;
            output.extend_from_slice(cursor.read_bytes(run)?);
        } else {
            let element = cursor.read_bytes(element_width)?;
            let copies = 257 - usize::from(control);
            for _ in 0..copies {
                output.extend_from_slice(element);
            }
        }
    }

    Ok(output)
}

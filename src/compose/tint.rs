use image::RgbaImage;

use crate::foundation::error::{ToonlinkError, ToonlinkResult};
use crate::foundation::math::mul_div255_u8;
use crate::scene::model::NEUTRAL_BODY_COLOR;

/// Parse a `#RRGGBB` string into straight RGB bytes.
pub fn parse_hex_rgb(s: &str) -> ToonlinkResult<[u8; 3]> {
    fn hex_byte(pair: &str) -> ToonlinkResult<u8> {
        u8::from_str_radix(pair, 16)
            .map_err(|_| ToonlinkError::validation(format!("invalid hex byte \"{pair}\"")))
    }

    let digits = s
        .strip_prefix('#')
        .filter(|d| d.len() == 6)
        .ok_or_else(|| ToonlinkError::validation(format!("color must be #RRGGBB, got {s:?}")))?;

    Ok([
        hex_byte(&digits[0..2])?,
        hex_byte(&digits[2..4])?,
        hex_byte(&digits[4..6])?,
    ])
}

/// Whether a body should be tinted at all: it must declare itself
/// colorizable and the chosen color must differ from the neutral default.
pub fn needs_tint(colorizable: bool, color: &str) -> bool {
    colorizable && !color.eq_ignore_ascii_case(NEUTRAL_BODY_COLOR)
}

/// Recolor a body image by multiply-compositing `rgb` over it while keeping
/// the original alpha channel.
///
/// This is the per-pixel form of the canvas two-pass tint (multiply blend,
/// then restoring alpha from the source): opaque pixels take the tint,
/// transparency is untouched.
pub fn tint_multiply(src: &RgbaImage, rgb: [u8; 3]) -> RgbaImage {
    let mut out = src.clone();
    for px in out.pixels_mut() {
        px.0[0] = mul_div255_u8(u16::from(px.0[0]), u16::from(rgb[0]));
        px.0[1] = mul_div255_u8(u16::from(px.0[1]), u16::from(rgb[1]));
        px.0[2] = mul_div255_u8(u16::from(px.0[2]), u16::from(rgb[2]));
        // px.0[3] stays: alpha restoration.
    }
    out
}

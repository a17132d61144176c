//! Bitmap text for chart labels and detection captions.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Side of one unscaled glyph cell in pixels
pub const GLYPH_SIZE: u32 = 8;

/// Pixel size of `text` drawn at `scale`.
pub fn text_size(text: &str, scale: u32) -> (u32, u32) {
    let scale = scale.max(1);
    (
        text.chars().count() as u32 * GLYPH_SIZE * scale,
        GLYPH_SIZE * scale,
    )
}

/// Draw `text` with its top-left corner at (x, y). Pixels outside the canvas are clipped.
pub fn draw_text(canvas: &mut RgbImage, x: i32, y: i32, scale: u32, color: Rgb<u8>, text: &str) {
    let scale = scale.max(1);
    let step = (GLYPH_SIZE * scale) as i32;
    for (i, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let origin_x = x + i as i32 * step;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                // bit 0 is the leftmost pixel
                if bits & (1 << col) != 0 {
                    fill_clipped(
                        canvas,
                        origin_x + (col * scale) as i32,
                        y + (row as u32 * scale) as i32,
                        scale,
                        scale,
                        color,
                    );
                }
            }
        }
    }
}

/// Filled rectangle, silently clipped to the canvas. Zero-sized or fully
/// outside rectangles draw nothing.
pub fn fill_clipped(canvas: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, color: Rgb<u8>) {
    let (cw, ch) = canvas.dimensions();
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w as i32).min(cw as i32);
    let y1 = (y + h as i32).min(ch as i32);
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    draw_filled_rect_mut(
        canvas,
        Rect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32),
        color,
    );
}

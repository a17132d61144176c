//! Burn detections into a frame: a coloured box per detection and a
//! `label conf` caption on a filled strip above it.

use colorgrad::Gradient;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::config::DETECTION_PALETTE;
use crate::detect::Detection;
use crate::render::text::{draw_text, fill_clipped, text_size};

const LINE_WIDTH: u32 = 3;
const CAPTION_SCALE: u32 = 2;
const CAPTION_PAD: u32 = 4;
const FALLBACK_COLOR: Rgb<u8> = Rgb([255, 56, 56]);

/// One colour per class id, cycling through the detection palette.
pub struct ClassPalette {
    gradient: Option<colorgrad::LinearGradient>,
    stops: usize,
}

impl Default for ClassPalette {
    fn default() -> Self {
        let gradient = colorgrad::GradientBuilder::new()
            .html_colors(DETECTION_PALETTE)
            .build::<colorgrad::LinearGradient>();
        if let Err(e) = &gradient {
            log::warn!("Detection palette rejected ({}), using a single colour", e);
        }
        Self {
            gradient: gradient.ok(),
            stops: DETECTION_PALETTE.len(),
        }
    }
}

impl ClassPalette {
    pub fn color(&self, class_id: usize) -> Rgb<u8> {
        let Some(gradient) = &self.gradient else {
            return FALLBACK_COLOR;
        };
        if self.stops < 2 {
            return FALLBACK_COLOR;
        }
        let t = (class_id % self.stops) as f32 / (self.stops - 1) as f32;
        let [r, g, b, _] = gradient.at(t).to_rgba8();
        Rgb([r, g, b])
    }
}

/// Black or white, whichever reads better on `bg`.
fn caption_text_color(bg: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = bg.0;
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 150.0 {
        Rgb([0, 0, 0])
    } else {
        Rgb([255, 255, 255])
    }
}

/// Copy of `image` with every detection drawn. No detections, no change.
pub fn draw_detections(image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = image.clone();
    if detections.is_empty() {
        return canvas;
    }
    let palette = ClassPalette::default();
    let (width, height) = canvas.dimensions();

    for det in detections {
        let bbox = det.bbox.clamp_to(width, height);
        let color = palette.color(det.class_id);
        let x = bbox.x1.round() as i32;
        let y = bbox.y1.round() as i32;
        let w = (bbox.x2 - bbox.x1).round() as i32;
        let h = (bbox.y2 - bbox.y1).round() as i32;

        for inset in 0..LINE_WIDTH as i32 {
            let (iw, ih) = (w - 2 * inset, h - 2 * inset);
            if iw <= 0 || ih <= 0 {
                break;
            }
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(x + inset, y + inset).of_size(iw as u32, ih as u32),
                color,
            );
        }

        let caption = format!("{} {:.2}", det.label, det.confidence);
        let (tw, th) = text_size(&caption, CAPTION_SCALE);
        let strip_h = th + 2 * CAPTION_PAD;
        // Above the box, or inside it when there is no room at the top
        let strip_y = if y >= strip_h as i32 { y - strip_h as i32 } else { y };
        fill_clipped(&mut canvas, x, strip_y, tw + 2 * CAPTION_PAD, strip_h, color);
        draw_text(
            &mut canvas,
            x + CAPTION_PAD as i32,
            strip_y + CAPTION_PAD as i32,
            CAPTION_SCALE,
            caption_text_color(color),
            &caption,
        );
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn frame() -> RgbImage {
        RgbImage::from_pixel(200, 120, Rgb([24, 26, 32]))
    }

    #[test]
    fn no_detections_leaves_the_frame_untouched() {
        let img = frame();
        assert_eq!(draw_detections(&img, &[]), img);
    }

    #[test]
    fn box_outline_uses_the_class_colour() {
        let img = frame();
        let det = Detection {
            bbox: BoundingBox::new(50.0, 60.0, 150.0, 110.0),
            class_id: 2,
            label: "M_Head".to_string(),
            confidence: 0.87,
        };
        let out = draw_detections(&img, &[det]);
        let color = ClassPalette::default().color(2);
        // bottom edge, clear of the caption strip
        assert_eq!(*out.get_pixel(100, 109), color);
        assert_eq!(*out.get_pixel(100, 85), *img.get_pixel(100, 85));
        assert_ne!(out, img);
    }

    #[test]
    fn boxes_past_the_edge_are_clamped() {
        let det = Detection {
            bbox: BoundingBox::new(-40.0, -40.0, 400.0, 400.0),
            class_id: 0,
            label: "Triangle".to_string(),
            confidence: 0.5,
        };
        let out = draw_detections(&frame(), &[det]);
        assert_eq!(out.dimensions(), (200, 120));
    }

    #[test]
    fn palette_cycles_over_class_ids() {
        let p = ClassPalette::default();
        assert_eq!(p.color(1), p.color(1 + DETECTION_PALETTE.len()));
        assert_ne!(p.color(0), p.color(1));
    }
}

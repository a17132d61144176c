use std::sync::{Arc, Mutex};

use eframe::egui::{
    self, CentralPanel, ColorImage, Context, Frame, RichText, TextureHandle, TextureOptions,
    Visuals,
};
use image::RgbImage;

use crate::ui::config::UI_CONFIG;

/// Error that closed a window, read back by the entry point after the
/// event loop returns.
pub type FatalSlot = Arc<Mutex<Option<String>>>;

pub fn fatal_slot() -> FatalSlot {
    Arc::new(Mutex::new(None))
}

pub fn set_fatal(slot: &FatalSlot, message: String) {
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(message);
    }
}

pub fn take_fatal(slot: &FatalSlot) -> Option<String> {
    slot.lock().ok().and_then(|mut guard| guard.take())
}

/// Sets up custom visuals for the entire application
pub fn setup_custom_visuals(ctx: &Context) {
    let mut visuals = Visuals::dark();
    visuals.panel_fill = UI_CONFIG.colors.panel;
    visuals.window_fill = UI_CONFIG.colors.panel;
    ctx.set_visuals(visuals);
}

pub fn quit_requested(ctx: &Context) -> bool {
    ctx.input(|i| i.key_pressed(UI_CONFIG.quit_key))
}

pub fn close_window(ctx: &Context) {
    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
}

pub fn to_color_image(frame: &RgbImage) -> ColorImage {
    let (w, h) = frame.dimensions();
    ColorImage::from_rgb([w as usize, h as usize], frame.as_raw())
}

/// Upload `frame`, reusing the texture after the first call.
pub fn upload_frame(
    ctx: &Context,
    texture: &mut Option<TextureHandle>,
    name: &str,
    frame: &RgbImage,
) {
    let image = to_color_image(frame);
    match texture {
        Some(handle) => handle.set(image, TextureOptions::LINEAR),
        None => *texture = Some(ctx.load_texture(name, image, TextureOptions::LINEAR)),
    }
}

/// Latest frame scaled to the window, or the status line until one exists.
pub fn show_frame(ctx: &Context, texture: Option<&TextureHandle>, status: &str) {
    CentralPanel::default()
        .frame(Frame::NONE.fill(UI_CONFIG.colors.panel))
        .show(ctx, |ui| match texture {
            Some(handle) => {
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Image::new(handle).shrink_to_fit());
                });
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new(status)
                            .size(UI_CONFIG.status_text_size)
                            .color(UI_CONFIG.colors.status),
                    );
                });
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn colour_image_keeps_size_and_pixels() {
        let frame = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let img = to_color_image(&frame);
        assert_eq!(img.size, [3, 2]);
        assert_eq!(img.pixels[5], egui::Color32::from_rgb(10, 20, 30));
    }

    #[test]
    fn fatal_slot_hands_over_once() {
        let slot = fatal_slot();
        set_fatal(&slot, "dimension mismatch".into());
        assert_eq!(take_fatal(&slot).as_deref(), Some("dimension mismatch"));
        assert_eq!(take_fatal(&slot), None);
    }
}

use std::time::Duration;

use eframe::{Frame, egui};

#[cfg(debug_assertions)]
use crate::config::debug::PRINT_SHUTDOWN;
use crate::capture::{CaptureLoop, FrameSource};
use crate::detect::Detector;
use crate::ui::utils::{
    FatalSlot, close_window, quit_requested, set_fatal, setup_custom_visuals, show_frame,
    upload_frame,
};

/// Window around the capture loop: one grab per repaint, `delay` apart.
pub struct CaptureApp<S: FrameSource, D: Detector> {
    capture: CaptureLoop<S, D>,
    delay: Duration,
    texture: Option<egui::TextureHandle>,
    status: String,
    fatal: FatalSlot,
}

impl<S: FrameSource, D: Detector> CaptureApp<S, D> {
    pub fn new(
        cc: &eframe::CreationContext,
        capture: CaptureLoop<S, D>,
        delay: Duration,
        fatal: FatalSlot,
    ) -> Self {
        setup_custom_visuals(&cc.egui_ctx);
        Self {
            capture,
            delay,
            texture: None,
            status: "Capturing...".to_string(),
            fatal,
        }
    }
}

impl<S: FrameSource, D: Detector> eframe::App for CaptureApp<S, D> {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        #[cfg(debug_assertions)]
        if PRINT_SHUTDOWN {
            log::info!("Screen watch closed.");
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if quit_requested(ctx) {
            close_window(ctx);
            return;
        }
        match self.capture.step() {
            Ok(frame) => {
                upload_frame(ctx, &mut self.texture, "screen", &frame.annotated);
                self.status = format!("{} patterns", frame.detections.len());
            }
            Err(e) => {
                log::error!("Screen watch stopped: {:#}", e);
                set_fatal(&self.fatal, format!("{:#}", e));
                close_window(ctx);
                return;
            }
        }
        show_frame(ctx, self.texture.as_ref(), &self.status);
        ctx.request_repaint_after(self.delay);
    }
}

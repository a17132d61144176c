use std::time::{Duration, Instant};

use eframe::{Frame, egui};

#[cfg(debug_assertions)]
use crate::config::debug::PRINT_SHUTDOWN;
use crate::detect::Detector;
use crate::pipeline::{ShutdownHandle, ViewerLoop, ViewerOutcome};
use crate::ui::utils::{
    FatalSlot, close_window, quit_requested, set_fatal, setup_custom_visuals, show_frame,
    upload_frame,
};

/// Window around the viewer loop: refresh on a timer, show the latest
/// annotated composite, quit on Q.
pub struct ViewerApp<D: Detector> {
    viewer: ViewerLoop<D>,
    refresh: Duration,
    last_tick: Option<Instant>,
    texture: Option<egui::TextureHandle>,
    status: String,
    fatal: FatalSlot,
    /// Stops the fetcher thread when the window goes away
    fetcher_shutdown: Option<ShutdownHandle>,
}

impl<D: Detector> ViewerApp<D> {
    pub fn new(
        cc: &eframe::CreationContext,
        viewer: ViewerLoop<D>,
        refresh: Duration,
        fatal: FatalSlot,
        fetcher_shutdown: Option<ShutdownHandle>,
    ) -> Self {
        setup_custom_visuals(&cc.egui_ctx);
        Self {
            viewer,
            refresh,
            last_tick: None,
            texture: None,
            status: "Waiting for charts...".to_string(),
            fatal,
            fetcher_shutdown,
        }
    }

    fn due(&self) -> bool {
        self.last_tick
            .is_none_or(|last| last.elapsed() >= self.refresh)
    }

    fn refresh_frame(&mut self, ctx: &egui::Context) {
        self.last_tick = Some(Instant::now());
        match self.viewer.tick() {
            Ok(ViewerOutcome::Frame(frame)) => {
                upload_frame(ctx, &mut self.texture, "composite", &frame.annotated);
                self.status = format!("{} patterns", frame.detections.len());
            }
            Ok(ViewerOutcome::Skipped { readable, expected }) => {
                // Keep showing the previous frame
                self.status = format!("Waiting for charts ({}/{})", readable, expected);
            }
            Err(e) => {
                log::error!("Viewer stopped: {}", e);
                set_fatal(&self.fatal, e.to_string());
                self.stop_fetcher();
                close_window(ctx);
            }
        }
    }

    fn stop_fetcher(&mut self) {
        if let Some(handle) = self.fetcher_shutdown.take() {
            handle.trigger();
        }
    }
}

impl<D: Detector> eframe::App for ViewerApp<D> {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.stop_fetcher();

        #[cfg(debug_assertions)]
        if PRINT_SHUTDOWN {
            log::info!("Viewer closed.");
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if quit_requested(ctx) {
            self.stop_fetcher();
            close_window(ctx);
            return;
        }
        if self.due() {
            self.refresh_frame(ctx);
        }
        show_frame(ctx, self.texture.as_ref(), &self.status);
        ctx.request_repaint_after(self.refresh);
    }
}

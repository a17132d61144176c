use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use eframe::{NativeOptions, egui};

use pattern_monitor::capture::{CaptureLoop, XcapRegion};
use pattern_monitor::ui::CaptureApp;
use pattern_monitor::ui::utils::{fatal_slot, take_fatal};
use pattern_monitor::{CaptureCli, DashboardConfig, YoloDetector, init_logging};

fn main() -> Result<()> {
    init_logging();

    let args = CaptureCli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    let mut config = DashboardConfig::resolve(args.config.as_deref())?;
    if let Some(model) = args.model {
        config.detector.model_path = model;
    }
    if let Some(region) = args.region {
        config.capture.region = region;
    }

    // Fatal before any window exists
    let detector = YoloDetector::load(&config.detector)?;
    let region = config.capture.region;
    log::info!(
        "Watching {}x{} at ({}, {})",
        region.width,
        region.height,
        region.left,
        region.top
    );

    let capture = CaptureLoop::new(XcapRegion::new(region), detector);
    let fatal = fatal_slot();
    let app_fatal = fatal.clone();
    let delay = Duration::from_millis(config.capture.delay_ms);
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.capture.window_title.clone())
            .with_inner_size([
                region.width as f32 / 2.0,
                region.height as f32 / 2.0,
            ]),
        ..Default::default()
    };

    eframe::run_native(
        &config.capture.window_title,
        options,
        Box::new(move |cc| Ok(Box::new(CaptureApp::new(cc, capture, delay, app_fatal)))),
    )
    .map_err(|e| anyhow!("Capture window failed: {}", e))?;

    if let Some(message) = take_fatal(&fatal) {
        bail!(message);
    }
    Ok(())
}

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use eframe::{NativeOptions, egui};

use pattern_monitor::pipeline::{
    ChartFetcher, Schedule, ViewerLoop, shutdown_channel, spawn_fetcher_thread,
};
use pattern_monitor::ui::ViewerApp;
use pattern_monitor::ui::utils::{fatal_slot, take_fatal};
use pattern_monitor::{Cli, DashboardConfig, SourceRegistry, YoloDetector, init_logging};

fn main() -> Result<()> {
    // A. Init Logging
    init_logging();

    // B. Parse Args and build the config
    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    let mut config = DashboardConfig::resolve(args.config.as_deref())?;
    if let Some(model) = args.model {
        config.detector.model_path = model;
    }
    if args.windowed {
        config.viewer.fullscreen = false;
    }

    // C. Detector (fatal before any window or thread exists)
    let detector = YoloDetector::load(&config.detector)?;

    // D. Background fetcher
    let (shutdown, signal) = shutdown_channel();
    if args.no_fetch {
        log::info!("Fetcher disabled, showing charts from {}", config.charts_dir.display());
    } else {
        let fetcher = ChartFetcher::new(&config, SourceRegistry::live()?);
        let schedule = Schedule::new(
            std::time::Duration::from_secs(config.fetcher.interval_secs),
            std::time::Duration::from_millis(config.fetcher.jitter_ms),
        );
        // Not joined on exit: the shutdown signal ends it at its next sleep
        spawn_fetcher_thread(fetcher, schedule, signal)?;
    }

    // E. Run Native App
    let viewer = ViewerLoop::new(&config, detector);
    let fatal = fatal_slot();
    let app_fatal = fatal.clone();
    let refresh = config.viewer.refresh();
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.viewer.window_title.clone())
            .with_fullscreen(config.viewer.fullscreen),
        ..Default::default()
    };

    eframe::run_native(
        &config.viewer.window_title,
        options,
        Box::new(move |cc| {
            Ok(Box::new(ViewerApp::new(
                cc,
                viewer,
                refresh,
                app_fatal,
                Some(shutdown),
            )))
        }),
    )
    .map_err(|e| anyhow!("Viewer window failed: {}", e))?;

    if let Some(message) = take_fatal(&fatal) {
        bail!(message);
    }
    Ok(())
}

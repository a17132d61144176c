#![allow(clippy::collapsible_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod capture;
pub mod config;
pub mod data;
pub mod detect;
pub mod domain;
pub mod pipeline;
pub mod render;
pub mod ui;
pub mod utils;

use std::path::PathBuf;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use data::{BarSource, SourceRegistry};
pub use detect::{Detection, Detector, YoloDetector};
pub use domain::{Bar, BarSeries, Instrument};
pub use pipeline::{ChartFetcher, Schedule, ViewerLoop};

// CLI argument parsing
use clap::Parser;

/// Fetch charts in the background and watch them for chart patterns
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file overriding the built-in configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Detector weights (ONNX), overrides the configured path
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Open a normal window instead of going fullscreen
    #[arg(long, default_value_t = false)]
    pub windowed: bool,

    /// Show the charts already on disk without starting the fetcher
    #[arg(long, default_value_t = false)]
    pub no_fetch: bool,
}

/// Watch a region of the screen for chart patterns
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CaptureCli {
    /// JSON file overriding the built-in configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Detector weights (ONNX), overrides the configured path
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Region as LEFT,TOP,WIDTH,HEIGHT in desktop pixels
    #[arg(long, value_parser = parse_region)]
    pub region: Option<config::CaptureRegion>,
}

/// Run one fetch cycle and exit
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct FetchCli {
    /// JSON file overriding the built-in configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also fetch the index instruments (S&P 500, gold futures)
    #[arg(long, default_value_t = false)]
    pub indices: bool,

    /// Only fetch the index instruments
    #[arg(long, default_value_t = false, conflicts_with = "indices")]
    pub indices_only: bool,
}

fn parse_region(s: &str) -> Result<config::CaptureRegion, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [left, top, width, height] = parts.as_slice() else {
        return Err(format!("expected LEFT,TOP,WIDTH,HEIGHT, got '{}'", s));
    };
    let int = |v: &str| v.parse::<i64>().map_err(|e| format!("'{}': {}", v, e));
    let (left, top, width, height) = (int(*left)?, int(*top)?, int(*width)?, int(*height)?);
    if width <= 0 || height <= 0 {
        return Err("width and height must be positive".to_string());
    }
    Ok(config::CaptureRegion {
        left: i32::try_from(left).map_err(|e| e.to_string())?,
        top: i32::try_from(top).map_err(|e| e.to_string())?,
        width: u32::try_from(width).map_err(|e| e.to_string())?,
        height: u32::try_from(height).map_err(|e| e.to_string())?,
    })
}

pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

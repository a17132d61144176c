//! Configuration module for the pattern monitor.

pub mod binance;
pub mod chart;
pub mod debug;
pub mod detector;
pub mod instruments;
pub mod loops;
pub mod persistence;
pub mod settings;

// Re-export commonly used items
pub use binance::{BINANCE, YAHOO};
pub use chart::CHART_STYLE;
pub use detector::{DETECTION_PALETTE, DETECTOR};
pub use loops::{CAPTURE, FETCHER, VIEWER};
pub use persistence::{CHART_TEMP_PREFIX, CHARTS_DIR, DEFAULT_CONFIG_PATH, MODEL_PATH};
pub use settings::{
    CaptureRegion, CaptureSettings, ChartStyle, DashboardConfig, DetectorSettings,
    FetcherSettings, ViewerSettings,
};

//! Runtime configuration object.
//!
//! Built once at startup from the constants in this module tree, optionally
//! overridden by a JSON file, then passed by reference to the fetcher, the
//! viewer and the capture loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::config::chart::{CHART_STYLE, Rgb8};
use crate::config::detector::DETECTOR;
use crate::config::instruments::{
    CRYPTO_LIMIT, CRYPTO_PAIRS, INDEX_LIMIT, INDEX_RANGE, INDEX_TICKERS,
};
use crate::config::loops::{CAPTURE, FETCHER, VIEWER};
use crate::config::persistence::{CHARTS_DIR, DEFAULT_CONFIG_PATH, MODEL_PATH};
use crate::domain::{BarInterval, DataSource, Instrument};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FetcherSettings {
    pub interval_secs: u64,
    pub jitter_ms: u64,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            interval_secs: FETCHER.interval_secs,
            jitter_ms: FETCHER.jitter_ms,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerSettings {
    pub refresh_ms: u64,
    pub grid_columns: u32,
    pub window_title: String,
    pub fullscreen: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            refresh_ms: VIEWER.refresh_ms,
            grid_columns: VIEWER.grid_columns,
            window_title: VIEWER.window_title.to_string(),
            fullscreen: VIEWER.fullscreen,
        }
    }
}

impl ViewerSettings {
    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DetectorSettings {
    pub model_path: PathBuf,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub agnostic_nms: bool,
    pub max_detections: usize,
    pub input_size: u32,
    pub pad_value: u8,
    pub class_names: Vec<String>,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(MODEL_PATH),
            confidence_threshold: DETECTOR.confidence_threshold,
            iou_threshold: DETECTOR.iou_threshold,
            agnostic_nms: DETECTOR.agnostic_nms,
            max_detections: DETECTOR.max_detections,
            input_size: DETECTOR.input_size,
            pad_value: DETECTOR.pad_value,
            class_names: DETECTOR.class_names.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DetectorSettings {
    /// Label for a class id; unnamed ids fall back to "class{id}".
    pub fn label(&self, class_id: usize) -> String {
        self.class_names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class{}", class_id))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub top: i32,
    pub left: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CaptureSettings {
    pub region: CaptureRegion,
    pub delay_ms: u64,
    pub window_title: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            region: CaptureRegion {
                top: CAPTURE.region.top.max(0),
                left: CAPTURE.region.left,
                width: CAPTURE.region.width,
                height: CAPTURE.region.height,
            },
            delay_ms: CAPTURE.delay_ms,
            window_title: CAPTURE.window_title.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub up: Rgb8,
    pub down: Rgb8,
    pub background: Rgb8,
    pub text: Rgb8,
    pub grid: Rgb8,
    pub last_price_line: Rgb8,
    pub last_price_alpha: f32,
    pub close_line: Rgb8,
    pub moving_average_colors: Vec<Rgb8>,
    pub volume_panel_ratio: f32,
    pub title_height: u32,
    pub right_axis_width: u32,
    pub time_axis_height: u32,
    pub margin: u32,
    pub text_scale: u32,
    pub price_ticks: u32,
    pub time_ticks: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        let s = &CHART_STYLE;
        Self {
            width: s.width,
            height: s.height,
            up: s.up,
            down: s.down,
            background: s.background,
            text: s.text,
            grid: s.grid,
            last_price_line: s.last_price_line,
            last_price_alpha: s.last_price_alpha,
            close_line: s.close_line,
            moving_average_colors: s.moving_average_colors.to_vec(),
            volume_panel_ratio: s.volume_panel_ratio,
            title_height: s.title_height,
            right_axis_width: s.right_axis_width,
            time_axis_height: s.time_axis_height,
            margin: s.margin,
            text_scale: s.text_scale,
            price_ticks: s.price_ticks,
            time_ticks: s.time_ticks,
        }
    }
}

/// The Master Runtime Configuration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub charts_dir: PathBuf,
    /// Instruments shown in the viewer grid, in grid order
    pub instruments: Vec<Instrument>,
    /// Instruments only fetched by the one-shot fetch binary
    pub index_instruments: Vec<Instrument>,
    pub fetcher: FetcherSettings,
    pub viewer: ViewerSettings,
    pub detector: DetectorSettings,
    pub capture: CaptureSettings,
    pub chart: ChartStyle,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            charts_dir: PathBuf::from(CHARTS_DIR),
            instruments: default_crypto_instruments(),
            index_instruments: default_index_instruments(),
            fetcher: FetcherSettings::default(),
            viewer: ViewerSettings::default(),
            detector: DetectorSettings::default(),
            capture: CaptureSettings::default(),
            chart: ChartStyle::default(),
        }
    }
}

impl DashboardConfig {
    /// Defaults, overridden field by field by the JSON file at `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// `path` if given, else `DEFAULT_CONFIG_PATH` if it exists, else the defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if path.is_some() {
            return Self::load(path);
        }
        let default = Path::new(DEFAULT_CONFIG_PATH);
        if default.is_file() {
            log::info!("Using config overrides from {}", default.display());
            Self::load(Some(default))
        } else {
            Self::load(None)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            bail!("No instruments configured");
        }
        if self.viewer.grid_columns == 0 {
            bail!("viewer.grid_columns must be at least 1");
        }
        if let Some(inst) = self.all_instruments().find(|i| i.limit == 0) {
            bail!("{} has a lookback of 0 bars", inst.symbol);
        }
        if self.chart.width < 200 || self.chart.height < 200 {
            bail!(
                "Chart size {}x{} is too small to draw",
                self.chart.width,
                self.chart.height
            );
        }
        Ok(())
    }

    pub fn all_instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter().chain(self.index_instruments.iter())
    }

    /// Fixed output path of an instrument's chart.
    pub fn chart_path(&self, instrument: &Instrument) -> PathBuf {
        self.charts_dir.join(&instrument.chart_file)
    }

    /// Chart paths of the viewer grid, in grid order.
    pub fn grid_chart_paths(&self) -> Vec<PathBuf> {
        self.instruments.iter().map(|i| self.chart_path(i)).collect()
    }
}

fn default_crypto_instruments() -> Vec<Instrument> {
    CRYPTO_PAIRS
        .iter()
        .map(|(symbol, file)| Instrument {
            symbol: symbol.to_string(),
            source: DataSource::Binance,
            interval: BarInterval::FifteenMinutes,
            limit: CRYPTO_LIMIT,
            history_range: None,
            title: None,
            chart_file: file.to_string(),
            close_overlay: false,
            moving_averages: vec![],
        })
        .collect()
}

fn default_index_instruments() -> Vec<Instrument> {
    INDEX_TICKERS
        .iter()
        .map(|(ticker, title, file)| Instrument {
            symbol: ticker.to_string(),
            source: DataSource::Yahoo,
            interval: BarInterval::FiveMinutes,
            limit: INDEX_LIMIT,
            history_range: Some(INDEX_RANGE.to_string()),
            title: Some(title.to_string()),
            chart_file: file.to_string(),
            close_overlay: true,
            moving_averages: vec![],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_four_chart_grid() {
        let config = DashboardConfig::default();
        assert_eq!(config.instruments.len(), 4);
        assert_eq!(config.viewer.grid_columns, 2);
        assert_eq!(config.fetcher.interval_secs, 10);
        assert_eq!(config.viewer.refresh_ms, 2000);
        assert_eq!(
            config.grid_chart_paths()[0],
            PathBuf::from("charts").join("btc_15m_chart_binance.png")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn detector_defaults_carry_the_four_knobs() {
        let d = DetectorSettings::default();
        assert_eq!(d.confidence_threshold, 0.15);
        assert_eq!(d.iou_threshold, 0.6);
        assert!(!d.agnostic_nms);
        assert_eq!(d.max_detections, 1000);
        assert_eq!(d.label(4), "Triangle");
        assert_eq!(d.label(42), "class42");
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "charts_dir": "/tmp/charts", "viewer": {{ "grid_columns": 4 }} }}"#
        )
        .unwrap();
        let config = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.charts_dir, PathBuf::from("/tmp/charts"));
        assert_eq!(config.viewer.grid_columns, 4);
        assert_eq!(config.viewer.refresh_ms, 2000);
        assert_eq!(config.instruments.len(), 4);
    }

    #[test]
    fn zero_columns_is_rejected() {
        let mut config = DashboardConfig::default();
        config.viewer.grid_columns = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn capture_top_is_clamped_to_the_screen() {
        assert!(CaptureSettings::default().region.top >= 0);
    }
}

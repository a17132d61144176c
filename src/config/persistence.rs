//! File locations

/// Directory the fetcher writes chart images into and the viewer reads from
pub const CHARTS_DIR: &str = "charts";

/// Name prefix of in-flight chart writes; leftovers are removed when the fetcher starts
pub const CHART_TEMP_PREFIX: &str = ".chart-";

/// Default location of the detector weights (YOLOv8 ONNX export)
pub const MODEL_PATH: &str = "models/best.onnx";

/// Optional JSON override read at startup when present
pub const DEFAULT_CONFIG_PATH: &str = "pattern_monitor.json";

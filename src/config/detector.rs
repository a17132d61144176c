//! Detector configuration

pub struct DetectorConfig {
    /// Minimum class score for a candidate box
    pub confidence_threshold: f32,
    /// Overlap above which the weaker of two boxes is suppressed
    pub iou_threshold: f32,
    /// Suppress across classes instead of per class
    pub agnostic_nms: bool,
    /// Upper bound on boxes returned per image
    pub max_detections: usize,
    /// Square input side of the network
    pub input_size: u32,
    /// Letterbox padding grey level
    pub pad_value: u8,
    pub class_names: &'static [&'static str],
}

pub const DETECTOR: DetectorConfig = DetectorConfig {
    confidence_threshold: 0.15,
    iou_threshold: 0.6,
    agnostic_nms: false,
    max_detections: 1000,
    input_size: 640,
    pad_value: 114,
    class_names: &[
        "Head and shoulders bottom",
        "Head and shoulders top",
        "M_Head",
        "StockLine",
        "Triangle",
        "W_Bottom",
    ],
};

/// Box colours, spread over the class ids
pub const DETECTION_PALETTE: &[&str] = &[
    "#ff3838", "#ff9d97", "#ff701f", "#ffb21d", "#cff231", "#48f90a", "#3ddb86", "#1a9334",
    "#00d4bb", "#2c99a8", "#00c2ff", "#344593", "#6473ff", "#0018ec", "#8438ff", "#520085",
];

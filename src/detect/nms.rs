//! Greedy non-max suppression.

use crate::detect::Detection;

pub struct NmsParams {
    pub iou_threshold: f32,
    /// Suppress across classes instead of only within a class
    pub agnostic: bool,
    pub max_detections: usize,
}

/// Keep the strongest box of every overlapping cluster, highest confidence
/// first, at most `max_detections` of them.
pub fn non_max_suppression(mut candidates: Vec<Detection>, params: &NmsParams) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= params.max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            (params.agnostic || k.class_id == candidate.class_id)
                && k.bbox.iou(&candidate.bbox) > params.iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

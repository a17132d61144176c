//! YOLOv8 ONNX detector.
//!
//! Input is `[1, 3, S, S]` float RGB in `[0, 1]`, letterboxed: the frame is
//! scaled to fit inside `S x S` keeping its aspect ratio and centred on a
//! grey (`pad_value`) canvas. Output is `[1, 4 + C, A]`: for each of the `A`
//! anchors, the box centre and size in input pixels followed by `C` class
//! scores (already sigmoid-activated, no separate objectness).

use std::path::Path;
#[cfg(debug_assertions)]
use std::time::Instant;

use anyhow::{Context, Result, bail};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tract_onnx::prelude::*;
use tract_onnx::prelude::tract_ndarray::{ArrayView3, Ix3};

#[cfg(debug_assertions)]
use crate::config::debug::{PRINT_DETECTIONS, PRINT_INFERENCE_TIMINGS};
use crate::config::DetectorSettings;
use crate::detect::nms::{NmsParams, non_max_suppression};
use crate::detect::{BoundingBox, Detection, Detector};

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Mapping between frame pixels and letterboxed input pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    /// Input-space box back to frame space.
    pub fn unmap(&self, b: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            (b.x1 - self.pad_x) / self.scale,
            (b.y1 - self.pad_y) / self.scale,
            (b.x2 - self.pad_x) / self.scale,
            (b.y2 - self.pad_y) / self.scale,
        )
    }
}

/// Fit `image` into a `size` x `size` canvas filled with `pad_value`.
pub fn letterbox(image: &RgbImage, size: u32, pad_value: u8) -> (RgbImage, Letterbox) {
    let (w, h) = image.dimensions();
    let scale = (size as f32 / w.max(1) as f32).min(size as f32 / h.max(1) as f32);
    let new_w = ((w as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((h as f32 * scale).round() as u32).clamp(1, size);
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([pad_value; 3]));
    imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);
    (
        canvas,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        },
    )
}

/// NCHW float tensor, values scaled to `[0, 1]`.
pub fn to_input_tensor(image: &RgbImage) -> Tensor {
    let (w, h) = image.dimensions();
    tract_ndarray::Array4::from_shape_fn((1, 3, h as usize, w as usize), |(_, c, y, x)| {
        image.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
    .into()
}

/// Candidates above the confidence threshold, suppressed, in frame pixels.
pub fn decode_output(
    output: ArrayView3<f32>,
    letterbox: &Letterbox,
    frame_size: (u32, u32),
    settings: &DetectorSettings,
) -> Result<Vec<Detection>> {
    let (batch, channels, anchors) = output.dim();
    if batch != 1 || channels < 5 {
        bail!(
            "Unexpected detector output shape [{}, {}, {}]",
            batch,
            channels,
            anchors
        );
    }
    let classes = channels - 4;

    let mut candidates = Vec::new();
    for a in 0..anchors {
        let Some((class_id, confidence)) = (0..classes)
            .map(|c| (c, output[[0, 4 + c, a]]))
            .max_by(|x, y| x.1.total_cmp(&y.1))
        else {
            continue;
        };
        if confidence < settings.confidence_threshold {
            continue;
        }
        let input_box = BoundingBox::from_cxcywh(
            output[[0, 0, a]],
            output[[0, 1, a]],
            output[[0, 2, a]],
            output[[0, 3, a]],
        );
        candidates.push(Detection {
            bbox: letterbox
                .unmap(&input_box)
                .clamp_to(frame_size.0, frame_size.1),
            class_id,
            label: settings.label(class_id),
            confidence,
        });
    }

    let params = NmsParams {
        iou_threshold: settings.iou_threshold,
        agnostic: settings.agnostic_nms,
        max_detections: settings.max_detections,
    };
    Ok(non_max_suppression(candidates, &params))
}

pub struct YoloDetector {
    model: OnnxPlan,
    settings: DetectorSettings,
}

impl YoloDetector {
    pub fn load(settings: &DetectorSettings) -> Result<Self> {
        let path: &Path = &settings.model_path;
        let size = settings.input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("Failed to load detector model {}", path.display()))?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())?
            .into_optimized()
            .context("Failed to optimise detector model")?
            .into_runnable()?;
        log::info!(
            "Loaded detector {} ({} classes named)",
            path.display(),
            settings.class_names.len()
        );
        Ok(Self {
            model,
            settings: settings.clone(),
        })
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }
}

impl Detector for YoloDetector {
    fn score(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        #[cfg(debug_assertions)]
        let start = Instant::now();

        let (input, lb) = letterbox(image, self.settings.input_size, self.settings.pad_value);
        let outputs = self.model.run(tvec!(to_input_tensor(&input).into()))?;
        let view = outputs
            .first()
            .context("Detector produced no output")?
            .to_array_view::<f32>()?
            .into_dimensionality::<Ix3>()?;
        let detections = decode_output(view, &lb, image.dimensions(), &self.settings)?;

        #[cfg(debug_assertions)]
        {
            if PRINT_INFERENCE_TIMINGS {
                log::info!(
                    "Inference on {}x{} took {} ms",
                    image.width(),
                    image.height(),
                    start.elapsed().as_millis()
                );
            }
            if PRINT_DETECTIONS {
                for d in &detections {
                    log::info!("{} {:.2} at {:?}", d.label, d.confidence, d.bbox);
                }
            }
        }
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tract_onnx::prelude::tract_ndarray::Array3;

    fn settings() -> DetectorSettings {
        DetectorSettings::default()
    }

    #[test]
    fn wide_frame_is_padded_top_and_bottom() {
        let img = RgbImage::from_pixel(200, 100, Rgb([255, 0, 0]));
        let (out, lb) = letterbox(&img, 64, 114);
        assert_eq!(out.dimensions(), (64, 64));
        assert_eq!(lb.scale, 0.32);
        assert_eq!((lb.pad_x, lb.pad_y), (0.0, 16.0));
        assert_eq!(out.get_pixel(32, 2).0, [114, 114, 114]);
        let inside = out.get_pixel(32, 32).0;
        assert!(inside[0] > 250 && inside[1] < 5 && inside[2] < 5);
    }

    #[test]
    fn input_tensor_is_nchw_unit_range() {
        let img = RgbImage::from_pixel(4, 2, Rgb([255, 0, 51]));
        let t = to_input_tensor(&img);
        assert_eq!(t.shape(), &[1, 3, 2, 4]);
        let view = t
            .to_array_view::<f32>()
            .unwrap()
            .into_dimensionality::<tract_ndarray::Ix4>()
            .unwrap();
        assert_eq!(view[[0, 0, 1, 3]], 1.0);
        assert_eq!(view[[0, 1, 0, 0]], 0.0);
        assert!((view[[0, 2, 0, 0]] - 0.2).abs() < 1e-6);
    }

    /// Output with the given anchors: (cx, cy, w, h, class scores).
    fn output(anchors: &[(f32, f32, f32, f32, [f32; 6])]) -> Array3<f32> {
        Array3::from_shape_fn((1, 10, anchors.len()), |(_, ch, a)| {
            let (cx, cy, w, h, scores) = anchors[a];
            match ch {
                0 => cx,
                1 => cy,
                2 => w,
                3 => h,
                c => scores[c - 4],
            }
        })
    }

    #[test]
    fn boxes_are_mapped_back_to_frame_pixels() {
        let lb = Letterbox {
            scale: 0.5,
            pad_x: 0.0,
            pad_y: 10.0,
        };
        let out = output(&[(50.0, 60.0, 20.0, 20.0, [0.0, 0.0, 0.0, 0.0, 0.9, 0.1])]);
        let dets = decode_output(out.view(), &lb, (400, 400), &settings()).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 4);
        assert_eq!(dets[0].label, "Triangle");
        assert_eq!(dets[0].bbox, BoundingBox::new(80.0, 80.0, 120.0, 120.0));
    }

    #[test]
    fn weak_and_duplicate_boxes_are_removed() {
        let lb = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
        };
        let strong = [0.8, 0.0, 0.0, 0.0, 0.0, 0.0];
        let out = output(&[
            (100.0, 100.0, 40.0, 40.0, strong),
            (101.0, 100.0, 40.0, 40.0, [0.7, 0.0, 0.0, 0.0, 0.0, 0.0]),
            (300.0, 300.0, 40.0, 40.0, [0.1, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ]);
        let dets = decode_output(out.view(), &lb, (640, 640), &settings()).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].confidence, 0.8);
    }

    #[test]
    fn too_few_channels_is_an_error() {
        let lb = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
        };
        let out = Array3::<f32>::zeros((1, 4, 3));
        assert!(decode_output(out.view(), &lb, (10, 10), &settings()).is_err());
    }

    #[test]
    fn missing_model_file_fails_to_load() {
        let mut s = settings();
        s.model_path = "does/not/exist.onnx".into();
        assert!(YoloDetector::load(&s).is_err());
    }
}

//! Screen-capture variant: grab a fixed desktop region, detect, annotate.

use anyhow::{Context, Result, anyhow, bail};
use image::{DynamicImage, RgbImage, RgbaImage, imageops};
use xcap::Monitor;

use crate::config::CaptureRegion;
use crate::detect::{Detection, Detector};

/// Anything that can hand out RGB frames.
pub trait FrameSource {
    fn grab(&mut self) -> Result<RgbImage>;
}

/// Part of `region` that lies on a monitor at `origin` of size `size`, in
/// monitor-local pixels as (x, y, width, height).
pub fn clip_region(
    region: &CaptureRegion,
    origin: (i32, i32),
    size: (u32, u32),
) -> Option<(u32, u32, u32, u32)> {
    let left = (region.left - origin.0).max(0) as i64;
    let top = (region.top - origin.1).max(0) as i64;
    let right = ((region.left - origin.0) as i64 + region.width as i64).min(size.0 as i64);
    let bottom = ((region.top - origin.1) as i64 + region.height as i64).min(size.1 as i64);
    if right <= left || bottom <= top {
        return None;
    }
    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Captures `region` from the monitor holding its top-left corner. The
/// part of the region past that monitor's edge is cut off.
pub struct XcapRegion {
    region: CaptureRegion,
}

impl XcapRegion {
    pub fn new(region: CaptureRegion) -> Self {
        Self { region }
    }
}

impl FrameSource for XcapRegion {
    fn grab(&mut self) -> Result<RgbImage> {
        let r = &self.region;
        let monitor = Monitor::from_point(r.left, r.top)
            .map_err(|e| anyhow!("No monitor contains ({}, {}): {}", r.left, r.top, e))?;
        let shot = monitor
            .capture_image()
            .map_err(|e| anyhow!("Failed to capture monitor {}: {}", monitor.name(), e))?;
        let (shot_w, shot_h) = shot.dimensions();
        let shot = RgbaImage::from_raw(shot_w, shot_h, shot.into_raw())
            .context("Captured frame has an unexpected buffer size")?;

        let Some((x, y, w, h)) = clip_region(r, (monitor.x(), monitor.y()), shot.dimensions())
        else {
            bail!("Capture region {:?} is off monitor {}", r, monitor.name());
        };
        let cropped = imageops::crop_imm(&shot, x, y, w, h).to_image();
        Ok(DynamicImage::ImageRgba8(cropped).to_rgb8())
    }
}

pub struct CaptureFrame {
    pub annotated: RgbImage,
    pub detections: Vec<Detection>,
}

pub struct CaptureLoop<S: FrameSource, D: Detector> {
    source: S,
    detector: D,
}

impl<S: FrameSource, D: Detector> CaptureLoop<S, D> {
    pub fn new(source: S, detector: D) -> Self {
        Self { source, detector }
    }

    /// Grab one frame, score it and draw the detections.
    pub fn step(&mut self) -> Result<CaptureFrame> {
        let frame = self.source.grab()?;
        let detections = self.detector.score(&frame)?;
        let annotated = self.detector.render(&frame, &detections);
        Ok(CaptureFrame {
            annotated,
            detections,
        })
    }
}

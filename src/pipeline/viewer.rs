//! Viewer iteration: read every chart, composite, detect, annotate.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use image::RgbImage;

use crate::config::DashboardConfig;
use crate::detect::{Detection, Detector};
use crate::pipeline::composite::{CompositeError, compose_grid};
use crate::pipeline::handoff::read_chart;

/// Errors that end the viewer process.
#[derive(Debug)]
pub enum ViewerError {
    Composite(CompositeError),
    Detector(anyhow::Error),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ViewerError::Composite(e) => write!(f, "Cannot build composite: {}", e),
            ViewerError::Detector(e) => write!(f, "Detector failed: {:#}", e),
        }
    }
}

impl Error for ViewerError {}

impl From<CompositeError> for ViewerError {
    fn from(e: CompositeError) -> Self {
        ViewerError::Composite(e)
    }
}

/// Result of one composite-and-detect pass.
#[derive(Debug, Clone)]
pub struct ViewerFrame {
    pub composite: RgbImage,
    pub annotated: RgbImage,
    pub detections: Vec<Detection>,
}

#[derive(Debug, Clone)]
pub enum ViewerOutcome {
    /// Some charts could not be read; nothing was built or scored.
    Skipped { readable: usize, expected: usize },
    Frame(ViewerFrame),
}

pub struct ViewerLoop<D: Detector> {
    paths: Vec<PathBuf>,
    columns: u32,
    detector: D,
}

impl<D: Detector> ViewerLoop<D> {
    pub fn new(config: &DashboardConfig, detector: D) -> Self {
        Self::with_paths(config.grid_chart_paths(), config.viewer.grid_columns, detector)
    }

    pub fn with_paths(paths: Vec<PathBuf>, columns: u32, detector: D) -> Self {
        Self {
            paths,
            columns,
            detector,
        }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// One iteration. The detector runs exactly once per `Frame` and never
    /// for `Skipped`.
    pub fn tick(&self) -> Result<ViewerOutcome, ViewerError> {
        let mut images = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            match read_chart(path) {
                Ok(img) => images.push(img),
                Err(e) => log::warn!("{:#}", e),
            }
        }
        if images.len() < self.paths.len() || images.is_empty() {
            log::warn!(
                "Only {} of {} charts readable, skipping this refresh",
                images.len(),
                self.paths.len()
            );
            return Ok(ViewerOutcome::Skipped {
                readable: images.len(),
                expected: self.paths.len(),
            });
        }

        let composite = compose_grid(&images, self.columns)?;
        let detections = self
            .detector
            .score(&composite)
            .map_err(ViewerError::Detector)?;
        let annotated = self.detector.render(&composite, &detections);
        Ok(ViewerOutcome::Frame(ViewerFrame {
            composite,
            annotated,
            detections,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;
    use crate::pipeline::handoff::write_chart_atomically;
    use crate::render::encode_png;
    use image::Rgb;
    use std::cell::Cell;
    use std::path::Path;

    #[derive(Default)]
    struct CountingDetector {
        calls: Cell<usize>,
        hit: bool,
    }

    impl Detector for CountingDetector {
        fn score(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
            self.calls.set(self.calls.get() + 1);
            if !self.hit {
                return Ok(vec![]);
            }
            Ok(vec![Detection {
                bbox: BoundingBox::new(0.0, 30.0, image.width() as f32, image.height() as f32),
                class_id: 5,
                label: "W_Bottom".into(),
                confidence: 0.9,
            }])
        }
    }

    fn write(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_pixel(w, h, Rgb([20, 40, 60]));
        write_chart_atomically(&path, &encode_png(&img).unwrap()).unwrap();
        path
    }

    #[test]
    fn missing_chart_skips_without_scoring() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths: Vec<_> = (0..3).map(|i| write(dir.path(), &format!("{i}.png"), 40, 30)).collect();
        paths.push(dir.path().join("missing.png"));
        let viewer = ViewerLoop::with_paths(paths, 2, CountingDetector::default());
        match viewer.tick().unwrap() {
            ViewerOutcome::Skipped { readable, expected } => {
                assert_eq!((readable, expected), (3, 4));
            }
            ViewerOutcome::Frame(_) => panic!("expected a skip"),
        }
        assert_eq!(viewer.detector().calls.get(), 0);
    }

    #[test]
    fn four_charts_make_one_scored_grid() {
        let dir = tempfile::tempdir().unwrap();
        let paths = (0..4).map(|i| write(dir.path(), &format!("{i}.png"), 40, 30)).collect();
        let viewer = ViewerLoop::with_paths(
            paths,
            2,
            CountingDetector {
                hit: true,
                ..Default::default()
            },
        );
        let ViewerOutcome::Frame(frame) = viewer.tick().unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(frame.composite.dimensions(), (80, 60));
        assert_eq!(frame.detections.len(), 1);
        assert_ne!(frame.annotated, frame.composite);
        assert_eq!(viewer.detector().calls.get(), 1);
    }

    #[test]
    fn size_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write(dir.path(), "a.png", 40, 30),
            write(dir.path(), "b.png", 41, 30),
        ];
        let viewer = ViewerLoop::with_paths(paths, 2, CountingDetector::default());
        assert!(matches!(viewer.tick(), Err(ViewerError::Composite(_))));
        assert_eq!(viewer.detector().calls.get(), 0);
    }
}

//! Filesystem hand-off between the fetcher (writer) and the viewer (reader).
//!
//! The writer renders into a temporary file in the destination directory and
//! renames it over the fixed path, so a reader opening that path sees either
//! the previous chart or the new one, never a partial file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;

use crate::config::CHART_TEMP_PREFIX;

/// Atomically replace `path` with `bytes`.
pub fn write_chart_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create chart directory {}", dir.display()))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(CHART_TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("Failed to write chart for {}", path.display()))?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move chart into place at {}", path.display()))?;
    Ok(())
}

/// Delete temp files left in `dir` by writes that never reached the rename.
/// Returns how many were removed. A missing directory holds nothing.
pub fn remove_stale_temp_files(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list chart directory {}", dir.display()))?;

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let is_leftover = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(CHART_TEMP_PREFIX));
        if is_leftover && entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())
                .with_context(|| format!("Failed to remove {}", entry.path().display()))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Decode the chart at `path` as RGB.
pub fn read_chart(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(image.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::encode_png;
    use image::Rgb;

    #[test]
    fn written_chart_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chart.png");
        let img = RgbImage::from_pixel(6, 4, Rgb([1, 2, 3]));
        write_chart_atomically(&path, &encode_png(&img).unwrap()).unwrap();
        assert_eq!(read_chart(&path).unwrap(), img);
    }

    #[test]
    fn rewrite_replaces_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let a = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let b = RgbImage::from_pixel(3, 3, Rgb([0, 255, 0]));
        write_chart_atomically(&path, &encode_png(&a).unwrap()).unwrap();
        write_chart_atomically(&path, &encode_png(&b).unwrap()).unwrap();
        assert_eq!(read_chart(&path).unwrap(), b);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn interrupted_writes_are_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let chart = dir.path().join("btc.png");
        write_chart_atomically(&chart, &encode_png(&RgbImage::new(2, 2)).unwrap()).unwrap();
        // What a kill between create and rename leaves behind
        let leftover = tempfile::Builder::new()
            .prefix(CHART_TEMP_PREFIX)
            .tempfile_in(dir.path())
            .unwrap();
        let (_, leftover_path) = leftover.keep().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

        assert_eq!(remove_stale_temp_files(dir.path()).unwrap(), 1);
        assert!(!leftover_path.exists());
        assert!(chart.exists());
        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(remove_stale_temp_files(&dir.path().join("absent")).unwrap(), 0);
    }

    #[test]
    fn missing_and_corrupt_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_chart(&dir.path().join("absent.png")).is_err());
        let junk = dir.path().join("junk.png");
        std::fs::write(&junk, b"not a png").unwrap();
        assert!(read_chart(&junk).is_err());
    }
}

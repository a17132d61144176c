//! Row-major grid of equally sized chart images.

use std::error::Error;
use std::fmt;

use image::{GenericImage, RgbImage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeError {
    NoImages,
    ZeroColumns,
    DimensionMismatch {
        index: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompositeError::NoImages => write!(f, "No images to composite"),
            CompositeError::ZeroColumns => write!(f, "Grid needs at least one column"),
            CompositeError::DimensionMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "Image {} is {}x{}, expected {}x{} like the first image",
                index, found.0, found.1, expected.0, expected.1
            ),
        }
    }
}

impl Error for CompositeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl GridLayout {
    pub fn new(count: usize, columns: u32, cell_width: u32, cell_height: u32) -> Self {
        let columns = columns.max(1);
        let rows = (count as u32).div_ceil(columns);
        Self {
            columns,
            rows,
            cell_width,
            cell_height,
        }
    }

    pub fn width(&self) -> u32 {
        self.columns * self.cell_width
    }

    pub fn height(&self) -> u32 {
        self.rows * self.cell_height
    }

    /// Top-left corner of cell `index`.
    pub fn origin(&self, index: usize) -> (u32, u32) {
        let i = index as u32;
        (
            (i % self.columns) * self.cell_width,
            (i / self.columns) * self.cell_height,
        )
    }
}

/// Place `images` left to right, top to bottom, `columns` per row. Every
/// image must have the size of the first one. Cells past the last image in
/// an incomplete row stay black.
pub fn compose_grid(images: &[RgbImage], columns: u32) -> Result<RgbImage, CompositeError> {
    if columns == 0 {
        return Err(CompositeError::ZeroColumns);
    }
    let first = images.first().ok_or(CompositeError::NoImages)?;
    let expected = first.dimensions();
    if let Some((index, img)) = images
        .iter()
        .enumerate()
        .find(|(_, img)| img.dimensions() != expected)
    {
        return Err(CompositeError::DimensionMismatch {
            index,
            expected,
            found: img.dimensions(),
        });
    }

    let layout = GridLayout::new(images.len(), columns, expected.0, expected.1);
    let mut canvas = RgbImage::new(layout.width(), layout.height());
    for (i, img) in images.iter().enumerate() {
        let (x, y) = layout.origin(i);
        // Sizes were checked above, so the copy always fits.
        if canvas.copy_from(img, x, y).is_err() {
            return Err(CompositeError::DimensionMismatch {
                index: i,
                expected,
                found: img.dimensions(),
            });
        }
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn tile(w: u32, h: u32, v: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([v, v, v]))
    }

    #[test]
    fn four_images_make_a_two_by_two_grid() {
        let images: Vec<_> = (0..4).map(|i| tile(30, 20, i * 50)).collect();
        let grid = compose_grid(&images, 2).unwrap();
        // (2h, 2w) as rows x columns
        assert_eq!(grid.height(), 40);
        assert_eq!(grid.width(), 60);
        assert_eq!(grid.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(grid.get_pixel(30, 0).0, [50, 50, 50]);
        assert_eq!(grid.get_pixel(0, 20).0, [100, 100, 100]);
        assert_eq!(grid.get_pixel(59, 39).0, [150, 150, 150]);
    }

    #[test]
    fn incomplete_last_row_is_padded() {
        let images: Vec<_> = (0..3).map(|_| tile(10, 10, 200)).collect();
        let grid = compose_grid(&images, 2).unwrap();
        assert_eq!(grid.dimensions(), (20, 20));
        assert_eq!(grid.get_pixel(15, 15).0, [0, 0, 0]);
    }

    #[test]
    fn single_column_stacks_vertically() {
        let images = vec![tile(8, 4, 1), tile(8, 4, 2)];
        assert_eq!(compose_grid(&images, 1).unwrap().dimensions(), (8, 8));
    }

    #[test]
    fn mismatched_size_is_rejected() {
        let images = vec![tile(10, 10, 0), tile(10, 10, 0), tile(12, 10, 0)];
        assert_eq!(
            compose_grid(&images, 2),
            Err(CompositeError::DimensionMismatch {
                index: 2,
                expected: (10, 10),
                found: (12, 10),
            })
        );
    }

    #[test]
    fn empty_input_and_zero_columns_are_errors() {
        assert_eq!(compose_grid(&[], 2), Err(CompositeError::NoImages));
        assert_eq!(compose_grid(&[tile(1, 1, 0)], 0), Err(CompositeError::ZeroColumns));
    }
}

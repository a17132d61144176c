//! Chart rendering: bar series in, RGB raster out.

pub mod candlestick;
pub mod text;

pub use candlestick::{RenderError, encode_png, render_chart};

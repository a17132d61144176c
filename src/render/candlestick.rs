//! Candlestick chart rasterizer.
//!
//! `render_chart` is a pure function of the bar series, the instrument's
//! drawing options and the style: no clock, no randomness, no file I/O. The
//! same inputs always produce the same pixels, and `encode_png` is
//! deterministic, so an unchanged series re-encodes to identical bytes.

use std::error::Error;
use std::fmt;
use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::config::ChartStyle;
use crate::domain::{BarSeries, CandleType, Instrument};
use crate::render::text::{draw_text, fill_clipped, text_size};
use crate::utils::maths_utils::{min_max, rescale, simple_moving_average};
use crate::utils::time_utils::axis_label;

#[derive(Debug)]
pub enum RenderError {
    EmptySeries(String),
    Encode(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RenderError::EmptySeries(symbol) => write!(f, "{}: nothing to draw", symbol),
            RenderError::Encode(msg) => write!(f, "PNG encoding failed: {}", msg),
        }
    }
}

impl Error for RenderError {}

/// Pixel rectangles of the chart panels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub plot_left: f32,
    pub plot_right: f32,
    pub price_top: f32,
    pub price_bottom: f32,
    pub volume_top: f32,
    pub volume_bottom: f32,
    /// Horizontal space given to one bar
    pub slot_width: f32,
}

impl ChartLayout {
    const PANEL_GAP: f32 = 10.0;

    pub fn new(style: &ChartStyle, bar_count: usize) -> Self {
        let margin = style.margin as f32;
        let plot_left = margin;
        let plot_right = style.width as f32 - style.right_axis_width as f32;
        let top = style.title_height as f32;
        let bottom = style.height as f32 - style.time_axis_height as f32 - margin;
        let plot_height = (bottom - top).max(2.0);
        let volume_height = plot_height * style.volume_panel_ratio.clamp(0.0, 0.9);
        let price_bottom = bottom - volume_height - Self::PANEL_GAP;
        Self {
            plot_left,
            plot_right,
            price_top: top,
            price_bottom,
            volume_top: price_bottom + Self::PANEL_GAP,
            volume_bottom: bottom,
            slot_width: (plot_right - plot_left) / bar_count.max(1) as f32,
        }
    }

    /// Centre x of bar `i`.
    pub fn bar_x(&self, i: usize) -> f32 {
        self.plot_left + (i as f32 + 0.5) * self.slot_width
    }
}

/// Vertical price scale of the candle panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceScale {
    pub low: f64,
    pub high: f64,
    top: f32,
    bottom: f32,
}

impl PriceScale {
    /// Fits the bar range with 5% headroom. A flat series gets a band of
    /// ±1% (or ±1 for prices near zero) so it still has height.
    pub fn fit(series: &BarSeries, layout: &ChartLayout) -> Option<Self> {
        let (lo, hi) = min_max(series.bars().iter().flat_map(|b| [b.low, b.high]))?;
        let (lo, hi) = if hi - lo <= f64::EPSILON {
            let pad = (hi.abs() * 0.01).max(1.0);
            (lo - pad, hi + pad)
        } else {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        };
        Some(Self {
            low: lo,
            high: hi,
            top: layout.price_top,
            bottom: layout.price_bottom,
        })
    }

    pub fn y(&self, price: f64) -> f32 {
        rescale(
            price,
            self.low,
            self.high,
            self.bottom as f64,
            self.top as f64,
        ) as f32
    }
}

fn rgb(c: [u8; 3]) -> Rgb<u8> {
    Rgb(c)
}

/// `fg` over `bg` at opacity `alpha`.
pub fn blend(fg: [u8; 3], bg: [u8; 3], alpha: f32) -> Rgb<u8> {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |f: u8, b: u8| (f as f32 * a + b as f32 * (1.0 - a)).round() as u8;
    Rgb([mix(fg[0], bg[0]), mix(fg[1], bg[1]), mix(fg[2], bg[2])])
}

/// Draw the candlestick chart of `series` for `instrument`.
pub fn render_chart(
    series: &BarSeries,
    instrument: &Instrument,
    style: &ChartStyle,
) -> Result<RgbImage, RenderError> {
    if series.is_empty() {
        return Err(RenderError::EmptySeries(series.symbol.clone()));
    }
    let layout = ChartLayout::new(style, series.len());
    let scale = PriceScale::fit(series, &layout)
        .ok_or_else(|| RenderError::EmptySeries(series.symbol.clone()))?;

    let mut canvas = RgbImage::from_pixel(style.width, style.height, rgb(style.background));

    draw_title(&mut canvas, &instrument.chart_title(), style);
    draw_price_grid(&mut canvas, &layout, &scale, style);
    draw_time_axis(&mut canvas, series, &layout, style);
    draw_volume(&mut canvas, series, &layout, style);
    draw_candles(&mut canvas, series, &layout, &scale, style);

    if instrument.close_overlay {
        let closes: Vec<Option<f64>> = series.closes().into_iter().map(Some).collect();
        draw_polyline(&mut canvas, &closes, &layout, &scale, rgb(style.close_line));
    }
    let closes = series.closes();
    for (period, color) in instrument
        .moving_averages
        .iter()
        .zip(style.moving_average_colors.iter().cycle())
    {
        let sma = simple_moving_average(&closes, *period);
        draw_polyline(&mut canvas, &sma, &layout, &scale, rgb(*color));
    }

    draw_last_price(&mut canvas, series.last_close(), &layout, &scale, style);
    Ok(canvas)
}

/// PNG bytes of a rendered chart.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

fn draw_title(canvas: &mut RgbImage, title: &str, style: &ChartStyle) {
    let scale = style.text_scale + 1;
    let (w, h) = text_size(title, scale);
    let x = (style.width as i32 - w as i32) / 2;
    let y = (style.title_height as i32 - h as i32) / 2;
    draw_text(canvas, x.max(0), y.max(0), scale, rgb(style.text), title);
}

fn draw_price_grid(canvas: &mut RgbImage, layout: &ChartLayout, scale: &PriceScale, style: &ChartStyle) {
    let ticks = style.price_ticks.max(2);
    let (_, label_h) = text_size("0", style.text_scale);
    for i in 0..ticks {
        let price = scale.low + (scale.high - scale.low) * (i as f64 + 0.5) / ticks as f64;
        let y = scale.y(price);
        draw_line_segment_mut(
            canvas,
            (layout.plot_left, y),
            (layout.plot_right, y),
            rgb(style.grid),
        );
        draw_text(
            canvas,
            layout.plot_right as i32 + 8,
            y as i32 - label_h as i32 / 2,
            style.text_scale,
            rgb(style.text),
            &format!("{:.2}", price),
        );
    }
    // Panel frame
    let frame = Rect::at(layout.plot_left as i32, layout.price_top as i32).of_size(
        (layout.plot_right - layout.plot_left).max(1.0) as u32,
        (layout.volume_bottom - layout.price_top).max(1.0) as u32,
    );
    draw_hollow_rect_mut(canvas, frame, rgb(style.grid));
}

fn draw_time_axis(canvas: &mut RgbImage, series: &BarSeries, layout: &ChartLayout, style: &ChartStyle) {
    let bars = series.bars();
    let ticks = (style.time_ticks.max(1) as usize).min(bars.len());
    let step = (bars.len() / ticks).max(1);
    for i in (step / 2..bars.len()).step_by(step) {
        let x = layout.bar_x(i);
        draw_line_segment_mut(
            canvas,
            (x, layout.price_top),
            (x, layout.volume_bottom),
            rgb(style.grid),
        );
        let label = axis_label(bars[i].open_time_ms, series.interval_ms);
        let (w, _) = text_size(&label, style.text_scale);
        draw_text(
            canvas,
            x as i32 - w as i32 / 2,
            layout.volume_bottom as i32 + 8,
            style.text_scale,
            rgb(style.text),
            &label,
        );
    }
}

fn body_width(layout: &ChartLayout) -> u32 {
    ((layout.slot_width * 0.7).round() as u32).max(1)
}

fn draw_volume(canvas: &mut RgbImage, series: &BarSeries, layout: &ChartLayout, style: &ChartStyle) {
    let max_volume = series
        .bars()
        .iter()
        .map(|b| b.volume)
        .fold(0.0_f64, f64::max);
    if max_volume <= 0.0 {
        return;
    }
    let panel_height = layout.volume_bottom - layout.volume_top;
    let width = body_width(layout);
    for (i, bar) in series.bars().iter().enumerate() {
        let h = (bar.volume / max_volume * panel_height as f64).round() as u32;
        let color = match bar.candle_type() {
            CandleType::Bullish => style.up,
            CandleType::Bearish => style.down,
        };
        let x = layout.bar_x(i) - width as f32 / 2.0;
        fill_clipped(
            canvas,
            x.round() as i32,
            (layout.volume_bottom as u32).saturating_sub(h) as i32,
            width,
            h,
            rgb(color),
        );
    }
}

fn draw_candles(
    canvas: &mut RgbImage,
    series: &BarSeries,
    layout: &ChartLayout,
    scale: &PriceScale,
    style: &ChartStyle,
) {
    let width = body_width(layout);
    for (i, bar) in series.bars().iter().enumerate() {
        let color = rgb(match bar.candle_type() {
            CandleType::Bullish => style.up,
            CandleType::Bearish => style.down,
        });
        let cx = layout.bar_x(i);
        // Wick uses the body colour
        draw_line_segment_mut(canvas, (cx, scale.y(bar.high)), (cx, scale.y(bar.low)), color);

        let (body_low, body_high) = bar.body_range();
        let top = scale.y(body_high);
        let height = (scale.y(body_low) - top).round().max(1.0) as u32;
        fill_clipped(
            canvas,
            (cx - width as f32 / 2.0).round() as i32,
            top.round() as i32,
            width,
            height,
            color,
        );
    }
}

fn draw_polyline(
    canvas: &mut RgbImage,
    values: &[Option<f64>],
    layout: &ChartLayout,
    scale: &PriceScale,
    color: Rgb<u8>,
) {
    let points: Vec<Option<(f32, f32)>> = values
        .iter()
        .enumerate()
        .map(|(i, v)| v.map(|p| (layout.bar_x(i), scale.y(p))))
        .collect();
    for pair in points.windows(2) {
        if let [Some(a), Some(b)] = pair {
            draw_line_segment_mut(canvas, *a, *b, color);
        }
    }
}

fn draw_last_price(
    canvas: &mut RgbImage,
    last: f64,
    layout: &ChartLayout,
    scale: &PriceScale,
    style: &ChartStyle,
) {
    const DASH: f32 = 10.0;
    const GAP: f32 = 6.0;

    let y = scale.y(last).round();
    let color = blend(style.last_price_line, style.background, style.last_price_alpha);
    let mut x = layout.plot_left;
    while x < layout.plot_right {
        let end = (x + DASH).min(layout.plot_right);
        draw_line_segment_mut(canvas, (x, y), (end, y), color);
        x += DASH + GAP;
    }

    // Price tag just right of the panel, over the axis labels
    let label = format!("{:.2}", last);
    let (w, h) = text_size(&label, style.text_scale);
    let pad = 6;
    let box_x = layout.plot_right as i32 + 4;
    let box_y = y as i32 - h as i32 / 2 - pad;
    let box_w = w + 2 * pad as u32;
    let box_h = h + 2 * pad as u32;
    fill_clipped(canvas, box_x, box_y, box_w, box_h, rgb(style.background));
    if box_y >= 0 && box_x >= 0 {
        draw_hollow_rect_mut(
            canvas,
            Rect::at(box_x, box_y).of_size(box_w, box_h),
            rgb(style.text),
        );
    }
    draw_text(
        canvas,
        box_x + pad,
        box_y + pad,
        style.text_scale,
        rgb(style.text),
        &label,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, BarInterval, DataSource};

    fn instrument() -> Instrument {
        Instrument {
            symbol: "BTC/USDT".to_string(),
            source: DataSource::Binance,
            interval: BarInterval::FifteenMinutes,
            limit: 50,
            history_range: None,
            title: None,
            chart_file: "btc.png".to_string(),
            close_overlay: true,
            moving_averages: vec![7, 25],
        }
    }

    fn rising_series(n: usize) -> BarSeries {
        let bars = (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                Bar::new(i as i64 * 900_000, c - 0.5, c + 1.0, c - 1.0, c, 10.0 + i as f64)
            })
            .collect();
        BarSeries::new("BTC/USDT", 900_000, bars).unwrap()
    }

    fn small_style() -> ChartStyle {
        ChartStyle {
            width: 640,
            height: 360,
            ..ChartStyle::default()
        }
    }

    #[test]
    fn image_has_the_configured_size() {
        let img = render_chart(&rising_series(50), &instrument(), &small_style()).unwrap();
        assert_eq!(img.dimensions(), (640, 360));
    }

    #[test]
    fn same_input_renders_identical_bytes() {
        let series = rising_series(50);
        let style = small_style();
        let a = encode_png(&render_chart(&series, &instrument(), &style).unwrap()).unwrap();
        let b = encode_png(&render_chart(&series, &instrument(), &style).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bullish_candles_use_the_up_colour() {
        let style = small_style();
        let img = render_chart(&rising_series(10), &instrument(), &style).unwrap();
        assert!(img.pixels().any(|p| p.0 == style.up));
        assert!(!img.pixels().any(|p| p.0 == style.down));
    }

    #[test]
    fn last_price_marker_is_drawn_at_the_last_close() {
        let style = small_style();
        let series = rising_series(20);
        let img = render_chart(&series, &instrument(), &style).unwrap();
        let layout = ChartLayout::new(&style, series.len());
        let scale = PriceScale::fit(&series, &layout).unwrap();
        let y = scale.y(series.last_close()).round() as u32;
        let marker = blend(style.last_price_line, style.background, style.last_price_alpha);
        // first dash starts at the left edge of the panel
        let x = layout.plot_left as u32 + 2;
        assert_eq!(*img.get_pixel(x, y), marker);
    }

    #[test]
    fn flat_series_still_has_a_price_range() {
        let bars = (0..5)
            .map(|i| Bar::new(i * 60_000, 50.0, 50.0, 50.0, 50.0, 0.0))
            .collect();
        let series = BarSeries::new("FLAT", 60_000, bars).unwrap();
        let layout = ChartLayout::new(&small_style(), series.len());
        let scale = PriceScale::fit(&series, &layout).unwrap();
        assert!(scale.high > scale.low);
        assert!(render_chart(&series, &instrument(), &small_style()).is_ok());
    }

    #[test]
    fn blend_mixes_towards_the_background() {
        assert_eq!(blend([255, 255, 255], [0, 0, 0], 0.5), Rgb([128, 128, 128]));
        assert_eq!(blend([10, 20, 30], [0, 0, 0], 1.0), Rgb([10, 20, 30]));
    }
}

//! Candlestick chart styling ("Binance night" look)

pub type Rgb8 = [u8; 3];

pub struct ChartStyleConfig {
    pub width: u32,
    pub height: u32,
    pub up: Rgb8,
    pub down: Rgb8,
    pub background: Rgb8,
    pub text: Rgb8,
    pub grid: Rgb8,
    /// Dashed last-price marker colour and opacity over the background
    pub last_price_line: Rgb8,
    pub last_price_alpha: f32,
    pub close_line: Rgb8,
    pub moving_average_colors: &'static [Rgb8],
    /// Fraction of the plot height given to the volume panel
    pub volume_panel_ratio: f32,
    pub title_height: u32,
    pub right_axis_width: u32,
    pub time_axis_height: u32,
    pub margin: u32,
    pub text_scale: u32,
    pub price_ticks: u32,
    pub time_ticks: u32,
}

pub const CHART_STYLE: ChartStyleConfig = ChartStyleConfig {
    width: 1920,
    height: 960,
    up: [0x0e, 0xcb, 0x81],
    down: [0xf6, 0x46, 0x5d],
    background: [0x18, 0x1a, 0x20],
    text: [0xff, 0xff, 0xff],
    grid: [0x2b, 0x2f, 0x36],
    last_price_line: [0xff, 0xff, 0xff],
    last_price_alpha: 0.7,
    close_line: [0xff, 0xe2, 0x85],
    // Yellow, pink, purple
    moving_average_colors: &[[0xff, 0xda, 0x55], [0xe4, 0x99, 0xe6], [0x83, 0x69, 0xd1]],
    volume_panel_ratio: 0.22,
    title_height: 56,
    right_axis_width: 170,
    time_axis_height: 36,
    margin: 24,
    text_scale: 2,
    price_ticks: 6,
    time_ticks: 6,
};

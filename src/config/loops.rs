//! Timing knobs for the fetcher, viewer and capture loops.

/// Fetcher schedule
pub struct FetcherConfig {
    /// Pause after every full pass over the instruments
    pub interval_secs: u64,
    /// Random extra delay added to each pause (0 disables jitter)
    pub jitter_ms: u64,
}

pub const FETCHER: FetcherConfig = FetcherConfig {
    interval_secs: 10,
    jitter_ms: 0,
};

/// Viewer refresh and layout
pub struct ViewerConfig {
    pub refresh_ms: u64,
    /// Charts per row of the composite
    pub grid_columns: u32,
    pub window_title: &'static str,
    pub fullscreen: bool,
}

pub const VIEWER: ViewerConfig = ViewerConfig {
    refresh_ms: 2000,
    grid_columns: 2,
    window_title: "Pattern Monitor (BTC/ETH/SOL/PAXG)",
    fullscreen: true,
};

/// Rectangle of the virtual desktop to watch, in screen pixels
pub struct CaptureRegionConfig {
    pub top: i32,
    pub left: i32,
    pub width: u32,
    pub height: u32,
}

pub struct CaptureConfig {
    pub region: CaptureRegionConfig,
    /// Delay between frames
    pub delay_ms: u64,
    pub window_title: &'static str,
}

pub const CAPTURE: CaptureConfig = CaptureConfig {
    // Second monitor of a side-by-side 2560x1600 pair
    region: CaptureRegionConfig {
        top: 0,
        left: 2560,
        width: 2560,
        height: 1600,
    },
    delay_ms: 100,
    window_title: "Pattern Monitor - Screen",
};

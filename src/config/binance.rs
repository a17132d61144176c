//! Upstream provider configuration constants.

/// Default values for the Binance REST client
pub struct ClientDefaults {
    pub timeout_ms: u64,
    /// A failed request is not repeated; the fetcher moves on to the next instrument
    pub retries: u32,
}

/// Binance kline request limits
pub struct RestLimits {
    /// Largest `limit` a single klines request accepts
    pub max_klines_per_request: usize,
}

/// The Master Binance Configuration Struct
pub struct BinanceConfig {
    pub limits: RestLimits,
    pub client: ClientDefaults,
}

pub const BINANCE: BinanceConfig = BinanceConfig {
    limits: RestLimits {
        max_klines_per_request: 1000,
    },
    client: ClientDefaults {
        timeout_ms: 5000,
        retries: 0,
    },
};

/// Yahoo Finance chart endpoint
pub struct YahooConfig {
    /// The ticker is appended as the last path segment
    pub chart_url: &'static str,
    pub timeout_ms: u64,
    /// Range used when an instrument does not name one
    pub default_range: &'static str,
    /// Yahoo rejects requests without a browser-like agent
    pub user_agent: &'static str,
}

pub const YAHOO: YahooConfig = YahooConfig {
    chart_url: "https://query1.finance.yahoo.com/v8/finance/chart/",
    timeout_ms: 10_000,
    default_range: "5d",
    user_agent: "Mozilla/5.0 (X11; Linux x86_64) pattern-monitor",
};

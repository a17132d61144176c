//! Default instrument tables.

/// (symbol, chart file) of the four crypto pairs shown in the 2x2 viewer grid
pub const CRYPTO_PAIRS: &[(&str, &str)] = &[
    ("BTC/USDT", "btc_15m_chart_binance.png"),
    ("ETH/USDT", "eth_15m_chart_binance.png"),
    ("SOL/USDT", "sol_15m_chart_binance.png"),
    ("PAXG/USDT", "paxg_15m_chart_binance.png"),
];

/// Bars per crypto chart
pub const CRYPTO_LIMIT: usize = 50;

/// (ticker, title, chart file) of index instruments fetched on demand
pub const INDEX_TICKERS: &[(&str, &str, &str)] = &[
    ("^GSPC", "S&P 500 (^GSPC) Candle + Close-Line", "sp500_chart.png"),
    ("GC=F", "Gold Futures (GC=F) Chart", "gold_chart.png"),
];

/// 5 trading days of 5 minute bars is about 390 rows
pub const INDEX_LIMIT: usize = 400;
pub const INDEX_RANGE: &str = "5d";

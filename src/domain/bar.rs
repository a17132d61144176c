use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

// Define the CandleType enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleType {
    Bullish,
    Bearish,
}

/// One OHLCV sample. `open_time_ms` is the bar open time (UTC epoch ms).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub open_time_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(open_time_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Bar {
            open_time_ms,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn candle_type(&self) -> CandleType {
        if self.close >= self.open {
            CandleType::Bullish
        } else {
            CandleType::Bearish
        }
    }

    // Returns the low and high of the candle body as a tuple
    pub fn body_range(&self) -> (f64, f64) {
        match self.candle_type() {
            CandleType::Bullish => (self.open, self.close),
            CandleType::Bearish => (self.close, self.open),
        }
    }
}

/// Ordered bars for one instrument, ascending by open time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub symbol: String,
    pub interval_ms: i64,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Sorts by open time, drops duplicate open times (keeping the later row)
    /// and rejects empty input or bars whose prices are not finite.
    pub fn new(symbol: impl Into<String>, interval_ms: i64, mut bars: Vec<Bar>) -> Result<Self> {
        let symbol = symbol.into();
        if bars.is_empty() {
            bail!("{}: upstream returned no bars", symbol);
        }
        if let Some(bad) = bars.iter().find(|b| {
            !(b.open.is_finite() && b.high.is_finite() && b.low.is_finite() && b.close.is_finite())
        }) {
            bail!(
                "{}: bar at {} has a non-finite price",
                symbol,
                bad.open_time_ms
            );
        }
        bars.sort_by_key(|b| b.open_time_ms);
        // Keep the last of any run of equal open times; the newest row wins.
        bars.reverse();
        bars.dedup_by_key(|b| b.open_time_ms);
        bars.reverse();
        Ok(Self {
            symbol,
            interval_ms,
            bars,
        })
    }

    /// Keep only the most recent `limit` bars.
    pub fn keep_last(mut self, limit: usize) -> Self {
        if self.bars.len() > limit {
            let excess = self.bars.len() - limit;
            self.bars.drain(..excess);
        }
        self
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent close. The constructor guarantees at least one bar.
    pub fn last_close(&self) -> f64 {
        self.bars.last().map(|b| b.close).unwrap_or_default()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(t: i64, close: f64) -> Bar {
        Bar::new(t, close - 1.0, close + 1.0, close - 2.0, close, 10.0)
    }

    #[test]
    fn series_is_sorted_and_deduplicated() {
        let series = BarSeries::new(
            "BTCUSDT",
            60_000,
            vec![bar(120_000, 3.0), bar(0, 1.0), bar(60_000, 2.0), bar(120_000, 4.0)],
        )
        .unwrap();
        let times: Vec<i64> = series.bars().iter().map(|b| b.open_time_ms).collect();
        assert_eq!(times, vec![0, 60_000, 120_000]);
        // later duplicate wins
        assert_eq!(series.last_close(), 4.0);
    }

    #[test]
    fn empty_series_is_rejected() {
        assert!(BarSeries::new("X", 60_000, vec![]).is_err());
    }

    #[test]
    fn nan_prices_are_rejected() {
        let mut b = bar(0, 1.0);
        b.high = f64::NAN;
        assert!(BarSeries::new("X", 60_000, vec![b]).is_err());
    }

    #[test]
    fn keep_last_trims_oldest() {
        let bars = (0..10).map(|i| bar(i * 60_000, i as f64)).collect();
        let series = BarSeries::new("X", 60_000, bars).unwrap().keep_last(3);
        assert_eq!(series.len(), 3);
        assert_eq!(series.bars()[0].close, 7.0);
    }

    #[test]
    fn body_range_orders_open_and_close() {
        let bearish = Bar::new(0, 10.0, 11.0, 8.0, 9.0, 1.0);
        assert_eq!(bearish.candle_type(), CandleType::Bearish);
        assert_eq!(bearish.body_range(), (9.0, 10.0));
    }
}

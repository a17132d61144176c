use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::utils::TimeUtils;

/// Upstream provider an instrument is fetched from.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
pub enum DataSource {
    /// Binance spot klines
    Binance,
    /// Yahoo Finance chart history (equity indices, futures)
    Yahoo,
}

/// Bar width. Serialized with the exchange shorthand (`15m`, `1h`, ...).
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
pub enum BarInterval {
    #[serde(rename = "1m")]
    #[strum(serialize = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    #[strum(serialize = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    #[strum(serialize = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    #[strum(serialize = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    #[strum(serialize = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    #[strum(serialize = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    #[strum(serialize = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    #[strum(serialize = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    #[strum(serialize = "1w")]
    OneWeek,
}

impl BarInterval {
    pub fn to_ms(self) -> i64 {
        match self {
            BarInterval::OneMinute => TimeUtils::MS_IN_MIN,
            BarInterval::ThreeMinutes => TimeUtils::MS_IN_3_MIN,
            BarInterval::FiveMinutes => TimeUtils::MS_IN_5_MIN,
            BarInterval::FifteenMinutes => TimeUtils::MS_IN_15_MIN,
            BarInterval::ThirtyMinutes => TimeUtils::MS_IN_30_MIN,
            BarInterval::OneHour => TimeUtils::MS_IN_H,
            BarInterval::FourHours => TimeUtils::MS_IN_4_H,
            BarInterval::OneDay => TimeUtils::MS_IN_D,
            BarInterval::OneWeek => TimeUtils::MS_IN_W,
        }
    }

    /// Human readable suffix used in chart titles, e.g. "15Minute".
    pub fn title(self) -> &'static str {
        match self {
            BarInterval::OneMinute => "1Minute",
            BarInterval::ThreeMinutes => "3Minute",
            BarInterval::FiveMinutes => "5Minute",
            BarInterval::FifteenMinutes => "15Minute",
            BarInterval::ThirtyMinutes => "30Minute",
            BarInterval::OneHour => "1Hour",
            BarInterval::FourHours => "4Hour",
            BarInterval::OneDay => "Daily",
            BarInterval::OneWeek => "Weekly",
        }
    }

    /// Interval code accepted by the Yahoo chart endpoint. Yahoo has no 3m or 4h bars.
    pub fn yahoo_code(self) -> Option<&'static str> {
        match self {
            BarInterval::OneMinute => Some("1m"),
            BarInterval::FiveMinutes => Some("5m"),
            BarInterval::FifteenMinutes => Some("15m"),
            BarInterval::ThirtyMinutes => Some("30m"),
            BarInterval::OneHour => Some("1h"),
            BarInterval::OneDay => Some("1d"),
            BarInterval::OneWeek => Some("1wk"),
            BarInterval::ThreeMinutes | BarInterval::FourHours => None,
        }
    }
}

/// One configured chart: what to fetch, from where, and where the image goes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Instrument {
    /// Display symbol, e.g. "BTC/USDT" or "^GSPC"
    pub symbol: String,
    pub source: DataSource,
    pub interval: BarInterval,
    /// Number of most recent bars to chart
    pub limit: usize,
    /// Yahoo history range (e.g. "5d"). Ignored by Binance.
    #[serde(default)]
    pub history_range: Option<String>,
    /// Chart title. Defaults to "{symbol} {interval title}".
    #[serde(default)]
    pub title: Option<String>,
    /// File name of the rendered chart inside the charts directory
    pub chart_file: String,
    /// Draw a thin close-price line over the candles
    #[serde(default)]
    pub close_overlay: bool,
    /// Moving average periods to draw over the candles
    #[serde(default)]
    pub moving_averages: Vec<usize>,
}

impl Instrument {
    /// Symbol as Binance expects it: "BTC/USDT" -> "BTCUSDT".
    pub fn exchange_symbol(&self) -> String {
        self.symbol
            .chars()
            .filter(|c| *c != '/' && *c != '-')
            .collect::<String>()
            .to_uppercase()
    }

    pub fn chart_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => format!("{} {}", self.symbol, self.interval.title()),
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} ({} {})", self.symbol, self.source, self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn btc() -> Instrument {
        Instrument {
            symbol: "BTC/USDT".to_string(),
            source: DataSource::Binance,
            interval: BarInterval::FifteenMinutes,
            limit: 50,
            history_range: None,
            title: None,
            chart_file: "btc.png".to_string(),
            close_overlay: false,
            moving_averages: vec![],
        }
    }

    #[test]
    fn exchange_symbol_strips_separator() {
        assert_eq!(btc().exchange_symbol(), "BTCUSDT");
    }

    #[test]
    fn default_title_uses_interval_words() {
        assert_eq!(btc().chart_title(), "BTC/USDT 15Minute");
    }

    #[test]
    fn interval_round_trips_through_shorthand() {
        let parsed = BarInterval::from_str("15m").unwrap();
        assert_eq!(parsed, BarInterval::FifteenMinutes);
        assert_eq!(parsed.to_string(), "15m");
        assert_eq!(parsed.to_ms(), 900_000);
    }

    #[test]
    fn every_interval_round_trips_through_serde_and_strum() {
        for interval in BarInterval::iter() {
            let json = serde_json::to_string(&interval).unwrap();
            assert_eq!(json, format!("\"{}\"", interval));
            assert_eq!(BarInterval::from_str(&interval.to_string()).unwrap(), interval);
            assert!(interval.to_ms() > 0);
        }
    }

    #[test]
    fn yahoo_lacks_only_three_minute_and_four_hour_bars() {
        let missing: Vec<BarInterval> = BarInterval::iter()
            .filter(|i| i.yahoo_code().is_none())
            .collect();
        assert_eq!(
            missing,
            vec![BarInterval::ThreeMinutes, BarInterval::FourHours]
        );
    }

    #[test]
    fn every_source_parses_from_its_name() {
        for source in DataSource::iter() {
            assert_eq!(DataSource::from_str(&source.to_string()).unwrap(), source);
        }
    }

    #[test]
    fn instrument_reads_from_json_with_defaults() {
        let json = r#"{
            "symbol": "GC=F",
            "source": "Yahoo",
            "interval": "5m",
            "limit": 300,
            "history_range": "5d",
            "chart_file": "gold.png"
        }"#;
        let inst: Instrument = serde_json::from_str(json).unwrap();
        assert_eq!(inst.source, DataSource::Yahoo);
        assert_eq!(inst.interval, BarInterval::FiveMinutes);
        assert!(!inst.close_overlay);
        assert!(inst.moving_averages.is_empty());
    }
}

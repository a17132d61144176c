//! Yahoo Finance chart history (indices and futures).
//!
//! Endpoint: `GET {chart_url}{ticker}?range=5d&interval=5m`
//!
//! The response carries one `timestamp` array (epoch seconds) and parallel
//! `open/high/low/close/volume` arrays in which any slot may be `null`
//! (halted or not-yet-printed bars). Rows with a missing price are dropped,
//! a missing volume counts as zero.

use std::time::Duration;

use async_trait::async_trait;
use itertools::izip;
use reqwest::Url;
use serde::Deserialize;

use super::{BarSource, SourceError};
use crate::config::YAHOO;
use crate::domain::{Bar, BarSeries, Instrument};

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Quote {
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<f64>>,
}

pub struct YahooSource {
    client: reqwest::Client,
}

impl YahooSource {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(YAHOO.timeout_ms))
            .user_agent(YAHOO.user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BarSource for YahooSource {
    fn signature(&self) -> &'static str {
        "Yahoo Finance"
    }

    async fn fetch_bars(&self, instrument: &Instrument) -> Result<BarSeries, SourceError> {
        let url = chart_url(instrument)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::ConnectionFailed(format!("{}: {}", instrument, e)))?;

        if !response.status().is_success() {
            return Err(SourceError::ConnectionFailed(format!(
                "{}: Yahoo API error: {}",
                instrument,
                response.status()
            )));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("{}: {}", instrument, e)))?;

        let bars = bars_from_chart(body)?;
        BarSeries::new(instrument.symbol.clone(), instrument.interval.to_ms(), bars)
            .map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

/// Full request URL for an instrument.
pub fn chart_url(instrument: &Instrument) -> Result<Url, SourceError> {
    let interval = instrument.interval.yahoo_code().ok_or_else(|| {
        SourceError::Unsupported(format!(
            "Yahoo has no {} bars ({})",
            instrument.interval, instrument.symbol
        ))
    })?;
    let range = instrument
        .history_range
        .as_deref()
        .unwrap_or(YAHOO.default_range);

    let mut url =
        Url::parse(YAHOO.chart_url).map_err(|e| SourceError::Unsupported(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| SourceError::Unsupported("chart url cannot take a path".into()))?
        .pop_if_empty()
        .push(&instrument.symbol);
    url.query_pairs_mut()
        .append_pair("range", range)
        .append_pair("interval", interval);
    Ok(url)
}

pub fn bars_from_chart(body: ChartResponse) -> Result<Vec<Bar>, SourceError> {
    if let Some(err) = body.chart.error {
        return Err(SourceError::ConnectionFailed(format!(
            "{}: {}",
            err.code, err.description
        )));
    }
    let result = body
        .chart
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.swap_remove(0))
            }
        })
        .ok_or_else(|| SourceError::Malformed("chart response has no result".into()))?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::Malformed("chart response has no quote block".into()))?;

    let volumes = quote
        .volume
        .into_iter()
        .chain(std::iter::repeat(None))
        .take(result.timestamp.len());

    let bars = izip!(
        result.timestamp,
        quote.open,
        quote.high,
        quote.low,
        quote.close,
        volumes
    )
    .filter_map(|(ts, open, high, low, close, volume)| {
        Some(Bar::new(
            ts * 1000,
            open?,
            high?,
            low?,
            close?,
            volume.unwrap_or(0.0),
        ))
    })
    .collect();
    Ok(bars)
}

//! Upstream market-data providers behind one fetch seam.

pub mod binance;
pub mod yahoo;

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{BarSeries, DataSource, Instrument};

pub use binance::BinanceSource;
pub use yahoo::YahooSource;

/// Why a fetch produced no series. Every variant is local to one instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The provider cannot serve this instrument (unknown source, unsupported interval)
    Unsupported(String),
    /// Network, HTTP status or API-level failure
    ConnectionFailed(String),
    /// The response arrived but could not be turned into bars
    Malformed(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceError::Unsupported(msg) => write!(f, "Unsupported request: {}", msg),
            SourceError::ConnectionFailed(msg) => write!(f, "Upstream call failed: {}", msg),
            SourceError::Malformed(msg) => write!(f, "Malformed upstream data: {}", msg),
        }
    }
}

impl Error for SourceError {}

#[async_trait]
pub trait BarSource: Send + Sync {
    /// Most recent bars for `instrument`, at most `instrument.limit` of them.
    async fn fetch_bars(&self, instrument: &Instrument) -> Result<BarSeries, SourceError>;

    /// A unique identifier for this implementation (for log lines).
    fn signature(&self) -> &'static str;
}

/// Maps each data source kind to the provider that serves it.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<DataSource, Box<dyn BarSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry wired to the real Binance and Yahoo endpoints.
    pub fn live() -> Result<Self> {
        Ok(Self::new()
            .with(DataSource::Binance, Box::new(BinanceSource::new()?))
            .with(DataSource::Yahoo, Box::new(YahooSource::new()?)))
    }

    pub fn with(mut self, kind: DataSource, source: Box<dyn BarSource>) -> Self {
        self.sources.insert(kind, source);
        self
    }

    pub async fn fetch(&self, instrument: &Instrument) -> Result<BarSeries, SourceError> {
        let source = self.sources.get(&instrument.source).ok_or_else(|| {
            SourceError::Unsupported(format!("no provider registered for {}", instrument.source))
        })?;
        let series = source.fetch_bars(instrument).await?;
        Ok(series.keep_last(instrument.limit))
    }
}

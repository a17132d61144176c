// External crates
use async_trait::async_trait;
use binance_sdk::config::ConfigurationRestApi;
use binance_sdk::spot::{
    SpotRestApi,
    rest_api::{KlinesIntervalEnum, KlinesItemInner, KlinesParams, RestApi},
};
use binance_sdk::{errors, errors::ConnectorError as connection_error};

// Local crates
use super::{BarSource, SourceError};
use crate::config::BINANCE;
use crate::domain::{Bar, BarInterval, BarSeries, Instrument};

pub struct BinanceSource {
    rest_client: RestApi,
}

impl BinanceSource {
    /// One REST client for every kline request of this source.
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            rest_client: configure_binance_client()?,
        })
    }
}

#[async_trait]
impl BarSource for BinanceSource {
    fn signature(&self) -> &'static str {
        "Binance API"
    }

    async fn fetch_bars(&self, instrument: &Instrument) -> Result<BarSeries, SourceError> {
        let limit = instrument.limit.min(BINANCE.limits.max_klines_per_request);
        if limit < instrument.limit {
            log::warn!(
                "{} asks for {} bars; Binance serves at most {} per request",
                instrument,
                instrument.limit,
                limit
            );
        }

        let params = KlinesParams::builder(
            instrument.exchange_symbol(),
            klines_interval(instrument.interval),
        )
        .limit(limit as i32)
        .build()
        .map_err(|e| SourceError::Unsupported(format!("{}: {}", instrument, e)))?;

        let response = self
            .rest_client
            .klines(params)
            .await
            .map_err(|e| describe_connector_error(e, instrument))?;
        let rows = response
            .data()
            .await
            .map_err(|e| SourceError::Malformed(format!("{}: {:#}", instrument, e)))?;

        let bars = rows
            .into_iter()
            .map(bar_from_kline_row)
            .collect::<Result<Vec<Bar>, SourceError>>()?;

        BarSeries::new(instrument.symbol.clone(), instrument.interval.to_ms(), bars)
            .map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

fn configure_binance_client() -> Result<RestApi, SourceError> {
    let rest_conf = ConfigurationRestApi::builder()
        .timeout(BINANCE.client.timeout_ms)
        .retries(BINANCE.client.retries)
        .build()
        .map_err(|e| SourceError::ConnectionFailed(format!("client configuration: {}", e)))?;
    // Create the Spot REST API client
    Ok(SpotRestApi::production(rest_conf))
}

pub fn klines_interval(interval: BarInterval) -> KlinesIntervalEnum {
    match interval {
        BarInterval::OneMinute => KlinesIntervalEnum::Interval1m,
        BarInterval::ThreeMinutes => KlinesIntervalEnum::Interval3m,
        BarInterval::FiveMinutes => KlinesIntervalEnum::Interval5m,
        BarInterval::FifteenMinutes => KlinesIntervalEnum::Interval15m,
        BarInterval::ThirtyMinutes => KlinesIntervalEnum::Interval30m,
        BarInterval::OneHour => KlinesIntervalEnum::Interval1h,
        BarInterval::FourHours => KlinesIntervalEnum::Interval4h,
        BarInterval::OneDay => KlinesIntervalEnum::Interval1d,
        BarInterval::OneWeek => KlinesIntervalEnum::Interval1w,
    }
}

fn kline_field_to_float(field: Option<KlinesItemInner>, name: &str) -> Result<f64, SourceError> {
    match field {
        Some(KlinesItemInner::String(s)) => s
            .parse::<f64>()
            .map_err(|_| SourceError::Malformed(format!("{} is not a number: {:?}", name, s))),
        Some(_) => Err(SourceError::Malformed(format!("{} has the wrong type", name))),
        None => Err(SourceError::Malformed(format!("kline row ends before {}", name))),
    }
}

/// Binance kline row: [open time, open, high, low, close, volume, close time, ...]
pub fn bar_from_kline_row(row: Vec<KlinesItemInner>) -> Result<Bar, SourceError> {
    let mut items = row.into_iter();
    let open_time_ms = match items.next() {
        Some(KlinesItemInner::Integer(t)) => t,
        Some(_) => return Err(SourceError::Malformed("open_time has the wrong type".into())),
        None => return Err(SourceError::Malformed("empty kline row".into())),
    };
    let open = kline_field_to_float(items.next(), "open")?;
    let high = kline_field_to_float(items.next(), "high")?;
    let low = kline_field_to_float(items.next(), "low")?;
    let close = kline_field_to_float(items.next(), "close")?;
    let volume = kline_field_to_float(items.next(), "volume")?;
    Ok(Bar::new(open_time_ms, open, high, low, close, volume))
}

fn describe_connector_error(e: anyhow::Error, instrument: &Instrument) -> SourceError {
    if let Some(conn_err) = e.downcast_ref::<errors::ConnectorError>() {
        let detail = match conn_err {
            connection_error::ConnectorClientError(msg) => {
                format!("client error, check the request parameters: {}", msg)
            }
            connection_error::TooManyRequestsError(msg) => {
                format!("rate limit exceeded: {}", msg)
            }
            connection_error::RateLimitBanError(msg) => {
                format!("IP banned for excessive requests: {}", msg)
            }
            errors::ConnectorError::ServerError { msg, status_code } => {
                format!("server error {:?}: {}", status_code, msg)
            }
            errors::ConnectorError::NetworkError(msg) => format!("network error: {}", msg),
            errors::ConnectorError::NotFoundError(msg) => format!("not found: {}", msg),
            connection_error::BadRequestError(msg) => format!("bad request: {}", msg),
            other => format!("{:?}", other),
        };
        SourceError::ConnectionFailed(format!("{}: {}", instrument, detail))
    } else {
        SourceError::ConnectionFailed(format!("{}: {:#}", instrument, e))
    }
}

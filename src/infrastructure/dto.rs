use crate::application::config::OverlayStyle;
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{
    Bar, OHLCV, OverlayPoint, OverlaySeries, Price, Symbol, Timestamp, Volume,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Bar time as served by the backend: a `YYYY-MM-DD` trading day or Unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeDto {
    Day(String),
    UnixSeconds(i64),
}

impl TimeDto {
    pub fn to_timestamp(&self) -> ChartResult<Timestamp> {
        let millis = match self {
            TimeDto::Day(day) => NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|e| ChartError::Payload(format!("bad date '{day}': {e}")))?
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis())
                .ok_or_else(|| ChartError::Payload(format!("bad date '{day}'")))?,
            TimeDto::UnixSeconds(secs) => secs.saturating_mul(1000),
        };
        u64::try_from(millis)
            .map(Timestamp::from_millis)
            .map_err(|_| ChartError::Payload(format!("time before 1970: {:?}", self)))
    }
}

/// One candle of `/api/stock/{symbol}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleDto {
    pub time: TimeDto,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl CandleDto {
    pub fn to_domain_bar(&self) -> ChartResult<Bar> {
        let ohlcv = OHLCV::new(
            Price::from(self.open),
            Price::from(self.high),
            Price::from(self.low),
            Price::from(self.close),
            Volume::from(self.volume.unwrap_or(0.0)),
        );
        // prices are only carried for the host, so odd bars are kept
        if !ohlcv.is_valid() {
            crate::log_warn!(
                LogComponent::Infrastructure("Payload"),
                "inconsistent OHLC at {:?}",
                self.time
            );
        }
        Ok(Bar::new(self.time.to_timestamp()?, ohlcv))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaPointDto {
    pub time: TimeDto,
    pub value: f64,
}

/// Response body of `/api/stock/{symbol}`: bars plus one list per moving average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPayloadDto {
    pub symbol: String,
    pub candles: Vec<CandleDto>,
    #[serde(default)]
    pub ma: Vec<Vec<MaPointDto>>,
}

/// Decoded payload, ready for the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct StockSnapshot {
    pub symbol: Symbol,
    pub bars: Vec<Bar>,
    pub overlays: Vec<OverlaySeries>,
}

impl StockPayloadDto {
    pub fn from_json(json: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert into domain types. `ma[i]` takes its period and color from
    /// `styles[i]`; empty lines and lines without a style are dropped.
    pub fn to_snapshot(&self, styles: &[OverlayStyle]) -> ChartResult<StockSnapshot> {
        let symbol = Symbol::new(self.symbol.clone()).map_err(ChartError::Payload)?;

        let mut bars = self.candles.iter().map(CandleDto::to_domain_bar).collect::<ChartResult<Vec<_>>>()?;
        bars.sort_by_key(|b| b.time);

        let mut overlays = Vec::new();
        for (i, line) in self.ma.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let Some(style) = styles.get(i) else {
                crate::log_warn!(
                    LogComponent::Infrastructure("Payload"),
                    "{}: no overlay style for ma[{}], dropped",
                    symbol,
                    i
                );
                continue;
            };
            let points = line
                .iter()
                .map(|p| Ok(OverlayPoint { time: p.time.to_timestamp()?, value: p.value }))
                .collect::<ChartResult<Vec<_>>>()?;
            overlays.push(OverlaySeries::new(style.period, style.color, points));
        }

        Ok(StockSnapshot { symbol, bars, overlays })
    }
}

use std::borrow::Cow;

use derive_builder::Builder;
use derive_getters::Getters;
use rust_decimal::Decimal;
use serde::{de::IgnoredAny, Deserialize, Serialize};
use types::Interval;

use crate::rest::{endpoint::Endpoint, params::QueryParams};

/// Most bars Binance returns for one klines request.
pub const MAX_KLINES_LIMIT: u16 = 1000;

/// `GET /api/v3/klines`. Bars come back oldest first, identified by their
/// open time.
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Klines<'a> {
    #[builder(setter(into))]
    symbol: Cow<'a, str>,
    interval: Interval,
    /// Epoch ms, inclusive.
    #[builder(setter(strip_option), default)]
    start_time: Option<i64>,
    /// Epoch ms, inclusive.
    #[builder(setter(strip_option), default)]
    end_time: Option<i64>,
    #[builder(setter(strip_option), default)]
    limit: Option<u16>,
}

impl<'a> KlinesBuilder<'a> {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(limit)) = self.limit {
            if limit == 0 || limit > MAX_KLINES_LIMIT {
                return Err(format!("limit {limit} is outside 1..={MAX_KLINES_LIMIT}"));
            }
        }
        if let (Some(Some(start)), Some(Some(end))) = (self.start_time, self.end_time) {
            if start > end {
                return Err(format!("start_time {start} is after end_time {end}"));
            }
        }
        return Ok(());
    }
}

impl<'a> Endpoint for Klines<'a> {
    fn endpoint(&self) -> Cow<'static, str> {
        return Cow::Borrowed("api/v3/klines");
    }

    fn params(&self) -> QueryParams {
        let mut params = QueryParams::default();

        params
            .push("symbol", &self.symbol)
            .push("interval", self.interval)
            .push_opt("startTime", self.start_time)
            .push_opt("endTime", self.end_time)
            .push_opt("limit", self.limit);
        return params;
    }
}

/// A kline as Binance sends it: a 12 element array.
#[derive(Deserialize)]
pub struct RawKline(
    i64,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    i64,
    Decimal,
    i64,
    Decimal,
    Decimal,
    IgnoredAny,
);

#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
#[serde(from = "RawKline")]
pub struct Kline {
    open_time: i64,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
    close_time: i64,
    quote_asset_volume: Decimal,
    num_trades: i64,
    taker_buy_base_volume: Decimal,
    taker_buy_quote_volume: Decimal,
}

impl From<RawKline> for Kline {
    fn from(raw: RawKline) -> Self {
        return Self {
            open_time: raw.0,
            open: raw.1,
            high: raw.2,
            low: raw.3,
            close: raw.4,
            volume: raw.5,
            close_time: raw.6,
            quote_asset_volume: raw.7,
            num_trades: raw.8,
            taker_buy_base_volume: raw.9,
            taker_buy_quote_volume: raw.10,
        };
    }
}

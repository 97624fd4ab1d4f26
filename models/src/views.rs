//! Rows of the read-only views. Each is also computable from the base rows so
//! a store without SQL views can produce the same projection.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use diesel::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use types::Interval;

use crate::{Candle, TickerSnapshot};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize, Deserialize)]
#[diesel(table_name = crate::view_schema::latest_prices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LatestPrice {
    symbol: String,
    price: Decimal,
    price_change_percent: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    volume: Decimal,
    timestamp: DateTime<Utc>,
}

impl From<&TickerSnapshot> for LatestPrice {
    fn from(snapshot: &TickerSnapshot) -> Self {
        return Self {
            symbol: snapshot.symbol().to_owned(),
            price: *snapshot.price(),
            price_change_percent: *snapshot.price_change_percent(),
            high_price: *snapshot.high_price(),
            low_price: *snapshot.low_price(),
            volume: *snapshot.volume(),
            timestamp: *snapshot.timestamp(),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize, Deserialize)]
#[diesel(table_name = crate::view_schema::latest_candles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LatestCandle {
    symbol: String,
    interval: Interval,
    open_time: DateTime<Utc>,
    open_price: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    close_price: Decimal,
    volume: Decimal,
    close_time: DateTime<Utc>,
}

impl LatestCandle {
    /// `None` when an epoch-ms time is outside chrono's range.
    pub fn from_candle(candle: &Candle) -> Option<Self> {
        return Some(Self {
            symbol: candle.symbol().to_owned(),
            interval: *candle.interval(),
            open_time: DateTime::from_timestamp_millis(*candle.open_time())?,
            open_price: *candle.open_price(),
            high_price: *candle.high_price(),
            low_price: *candle.low_price(),
            close_price: *candle.close_price(),
            volume: *candle.volume(),
            close_time: DateTime::from_timestamp_millis(*candle.close_time())?,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize, Deserialize)]
#[diesel(table_name = crate::view_schema::api_stats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApiStat {
    endpoint: String,
    total_calls: i64,
    successful_calls: i64,
    failed_calls: i64,
    avg_response_time_ms: Option<Decimal>,
    last_call: DateTime<Utc>,
}

impl ApiStat {
    pub fn new(
        endpoint: String,
        total_calls: i64,
        successful_calls: i64,
        failed_calls: i64,
        avg_response_time_ms: Option<Decimal>,
        last_call: DateTime<Utc>,
    ) -> Self {
        return Self {
            endpoint,
            total_calls,
            successful_calls,
            failed_calls,
            avg_response_time_ms,
            last_call,
        };
    }
}

/// Price statistics over a window of snapshots. Every figure is `None` for an
/// empty window, `range_percent` also when the lowest price is zero.
#[derive(Debug, Clone, Default, PartialEq, Getters, Serialize, Deserialize)]
pub struct PriceSummary {
    count: usize,
    highest: Option<Decimal>,
    lowest: Option<Decimal>,
    average: Option<Decimal>,
    range: Option<Decimal>,
    range_percent: Option<Decimal>,
}

impl PriceSummary {
    pub fn from_snapshots(snapshots: &[TickerSnapshot]) -> Self {
        let prices = snapshots.iter().map(|snapshot| *snapshot.price());
        let (Some(highest), Some(lowest)) = (prices.clone().max(), prices.clone().min()) else {
            return Self::default();
        };
        let sum: Decimal = prices.sum();
        let average = sum / Decimal::from(snapshots.len());
        let range = highest - lowest;
        let range_percent = if lowest.is_zero() {
            None
        } else {
            Some(round_cents(range * Decimal::ONE_HUNDRED / lowest))
        };

        return Self {
            count: snapshots.len(),
            highest: Some(highest.normalize()),
            lowest: Some(lowest.normalize()),
            average: Some(round_cents(average)),
            range: Some(range.normalize()),
            range_percent,
        };
    }
}

fn round_cents(value: Decimal) -> Decimal {
    return value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
}

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use derive_getters::Getters;
use diesel::prelude::*;
use garde::Validate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::ticker_snapshots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TickerSnapshot {
    id: i64,
    symbol: String,
    price: Decimal,
    price_change: Decimal,
    price_change_percent: Decimal,
    weighted_avg_price: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    open_price: Decimal,
    last_price: Decimal,
    volume: Decimal,
    quote_volume: Decimal,
    bid_price: Decimal,
    bid_qty: Decimal,
    ask_price: Decimal,
    ask_qty: Decimal,
    num_trades: i64,
    open_time: i64,
    close_time: i64,
    timestamp: DateTime<Utc>,
}

/// One 24h rolling-statistics read. `timestamp` is when it was fetched and
/// defaults to now.
#[derive(Debug, Clone, Insertable, Builder, Getters, Validate, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::ticker_snapshots)]
pub struct NewTickerSnapshot {
    #[garde(pattern(r"^[A-Z0-9]{2,20}$"))]
    symbol: String,
    #[garde(skip)]
    price: Decimal,
    #[builder(default)]
    #[garde(skip)]
    price_change: Decimal,
    #[builder(default)]
    #[garde(skip)]
    price_change_percent: Decimal,
    #[builder(default)]
    #[garde(skip)]
    weighted_avg_price: Decimal,
    #[builder(default)]
    #[garde(skip)]
    high_price: Decimal,
    #[builder(default)]
    #[garde(skip)]
    low_price: Decimal,
    #[builder(default)]
    #[garde(skip)]
    open_price: Decimal,
    #[builder(default)]
    #[garde(skip)]
    last_price: Decimal,
    #[builder(default)]
    #[garde(skip)]
    volume: Decimal,
    #[builder(default)]
    #[garde(skip)]
    quote_volume: Decimal,
    #[builder(default)]
    #[garde(skip)]
    bid_price: Decimal,
    #[builder(default)]
    #[garde(skip)]
    bid_qty: Decimal,
    #[builder(default)]
    #[garde(skip)]
    ask_price: Decimal,
    #[builder(default)]
    #[garde(skip)]
    ask_qty: Decimal,
    #[builder(default)]
    #[garde(range(min = 0))]
    num_trades: i64,
    #[builder(default)]
    #[garde(skip)]
    open_time: i64,
    #[builder(default)]
    #[garde(skip)]
    close_time: i64,
    #[builder(default = "chrono::Utc::now()")]
    #[garde(skip)]
    timestamp: DateTime<Utc>,
}

impl NewTickerSnapshot {
    pub fn into_ticker_snapshot(self, id: i64) -> TickerSnapshot {
        return TickerSnapshot {
            id,
            symbol: self.symbol,
            price: self.price,
            price_change: self.price_change,
            price_change_percent: self.price_change_percent,
            weighted_avg_price: self.weighted_avg_price,
            high_price: self.high_price,
            low_price: self.low_price,
            open_price: self.open_price,
            last_price: self.last_price,
            volume: self.volume,
            quote_volume: self.quote_volume,
            bid_price: self.bid_price,
            bid_qty: self.bid_qty,
            ask_price: self.ask_price,
            ask_qty: self.ask_qty,
            num_trades: self.num_trades,
            open_time: self.open_time,
            close_time: self.close_time,
            timestamp: self.timestamp,
        };
    }
}

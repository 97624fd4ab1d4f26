use chrono::{DateTime, Utc};
use derive_builder::Builder;
use derive_getters::Getters;
use diesel::prelude::*;
use garde::Validate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::Interval;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::candles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Candle {
    id: i64,
    symbol: String,
    interval: Interval,
    open_time: i64,
    open_price: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    close_price: Decimal,
    volume: Decimal,
    close_time: i64,
    quote_asset_volume: Decimal,
    num_trades: i64,
    taker_buy_base_volume: Decimal,
    taker_buy_quote_volume: Decimal,
    created_at: DateTime<Utc>,
}

impl Candle {
    pub fn key(&self) -> CandleKey {
        return CandleKey::new(&self.symbol, self.interval, self.open_time);
    }

    /// Replaces the bar's values with `candle`'s, keeping id and creation time.
    pub fn overwrite_with(&mut self, candle: &NewCandle) {
        self.open_price = candle.open_price;
        self.high_price = candle.high_price;
        self.low_price = candle.low_price;
        self.close_price = candle.close_price;
        self.volume = candle.volume;
        self.close_time = candle.close_time;
        self.quote_asset_volume = candle.quote_asset_volume;
        self.num_trades = candle.num_trades;
        self.taker_buy_base_volume = candle.taker_buy_base_volume;
        self.taker_buy_quote_volume = candle.taker_buy_quote_volume;
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset, Builder, Getters, Validate, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::candles)]
pub struct NewCandle {
    #[garde(pattern(r"^[A-Z0-9]{2,20}$"))]
    symbol: String,
    #[garde(skip)]
    interval: Interval,
    #[garde(range(min = 0))]
    open_time: i64,
    #[garde(skip)]
    open_price: Decimal,
    #[garde(skip)]
    high_price: Decimal,
    #[garde(skip)]
    low_price: Decimal,
    #[garde(skip)]
    close_price: Decimal,
    #[garde(skip)]
    volume: Decimal,
    #[garde(range(min = 0))]
    close_time: i64,
    #[builder(default)]
    #[garde(skip)]
    quote_asset_volume: Decimal,
    #[builder(default)]
    #[garde(range(min = 0))]
    num_trades: i64,
    #[builder(default)]
    #[garde(skip)]
    taker_buy_base_volume: Decimal,
    #[builder(default)]
    #[garde(skip)]
    taker_buy_quote_volume: Decimal,
}

impl NewCandle {
    pub fn key(&self) -> CandleKey {
        return CandleKey::new(&self.symbol, self.interval, self.open_time);
    }

    /// Field rules plus `close_time >= open_time`.
    pub fn check(&self) -> Result<(), String> {
        self.validate(&()).map_err(|report| report.to_string())?;
        if self.close_time < self.open_time {
            return Err(format!(
                "close_time {} is before open_time {}",
                self.close_time, self.open_time
            ));
        }
        return Ok(());
    }

    pub fn into_candle(self, id: i64, created_at: DateTime<Utc>) -> Candle {
        return Candle {
            id,
            symbol: self.symbol,
            interval: self.interval,
            open_time: self.open_time,
            open_price: self.open_price,
            high_price: self.high_price,
            low_price: self.low_price,
            close_price: self.close_price,
            volume: self.volume,
            close_time: self.close_time,
            quote_asset_volume: self.quote_asset_volume,
            num_trades: self.num_trades,
            taker_buy_base_volume: self.taker_buy_base_volume,
            taker_buy_quote_volume: self.taker_buy_quote_volume,
            created_at,
        };
    }
}

/// The `(symbol, interval, open_time)` triple that identifies one bar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Serialize, Deserialize)]
pub struct CandleKey {
    symbol: String,
    interval: Interval,
    open_time: i64,
}

impl CandleKey {
    pub fn new(symbol: &str, interval: Interval, open_time: i64) -> Self {
        return Self {
            symbol: symbol.to_owned(),
            interval,
            open_time,
        };
    }
}

impl std::fmt::Display for CandleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}/{}@{}", self.symbol, self.interval, self.open_time);
    }
}

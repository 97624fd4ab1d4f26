use std::borrow::Cow;

use derive_builder::Builder;
use derive_getters::Getters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rest::{endpoint::Endpoint, params::QueryParams};

/// `GET /api/v3/ticker/24hr`. With a symbol the answer is one `Ticker24h`,
/// without it a `Vec<Ticker24h>` covering every symbol.
#[derive(Debug, Clone, Default, Builder)]
pub struct Ticker24hr<'a> {
    #[builder(setter(into, strip_option), default)]
    symbol: Option<Cow<'a, str>>,
}

/// Rolling 24h statistics of one symbol.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    symbol: String,
    price_change: Decimal,
    price_change_percent: Decimal,
    weighted_avg_price: Decimal,
    #[serde(default)]
    prev_close_price: Decimal,
    last_price: Decimal,
    #[serde(default)]
    last_qty: Decimal,
    bid_price: Decimal,
    bid_qty: Decimal,
    ask_price: Decimal,
    ask_qty: Decimal,
    open_price: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    volume: Decimal,
    quote_volume: Decimal,
    open_time: i64,
    close_time: i64,
    #[serde(default)]
    first_id: i64,
    #[serde(default)]
    last_id: i64,
    count: i64,
}

impl<'a> Endpoint for Ticker24hr<'a> {
    fn endpoint(&self) -> Cow<'static, str> {
        return Cow::Borrowed("api/v3/ticker/24hr");
    }

    fn params(&self) -> QueryParams {
        let mut params = QueryParams::default();

        params.push_opt("symbol", self.symbol.as_ref());
        return params;
    }
}

/// `GET /api/v3/ticker/price`, the last price only. One `SymbolPrice` with a
/// symbol, a `Vec<SymbolPrice>` without.
#[derive(Debug, Clone, Default, Builder)]
pub struct TickerPrice<'a> {
    #[builder(setter(into, strip_option), default)]
    symbol: Option<Cow<'a, str>>,
}

#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct SymbolPrice {
    symbol: String,
    price: Decimal,
}

impl<'a> Endpoint for TickerPrice<'a> {
    fn endpoint(&self) -> Cow<'static, str> {
        return Cow::Borrowed("api/v3/ticker/price");
    }

    fn params(&self) -> QueryParams {
        let mut params = QueryParams::default();

        params.push_opt("symbol", self.symbol.as_ref());
        return params;
    }
}

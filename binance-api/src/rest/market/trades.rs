use std::borrow::Cow;

use derive_builder::Builder;
use derive_getters::Getters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rest::{endpoint::Endpoint, params::QueryParams};

pub const MAX_TRADES_LIMIT: u16 = 1000;

/// `GET /api/v3/trades`, the latest trades of one symbol, oldest first.
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RecentTrades<'a> {
    #[builder(setter(into))]
    symbol: Cow<'a, str>,
    #[builder(setter(strip_option), default)]
    limit: Option<u16>,
}

impl<'a> RecentTradesBuilder<'a> {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(limit)) = self.limit {
            if limit == 0 || limit > MAX_TRADES_LIMIT {
                return Err(format!("limit {limit} is outside 1..={MAX_TRADES_LIMIT}"));
            }
        }
        return Ok(());
    }
}

#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    id: i64,
    price: Decimal,
    qty: Decimal,
    quote_qty: Decimal,
    time: i64,
    is_buyer_maker: bool,
    is_best_match: bool,
}

impl<'a> Endpoint for RecentTrades<'a> {
    fn endpoint(&self) -> Cow<'static, str> {
        return Cow::Borrowed("api/v3/trades");
    }

    fn params(&self) -> QueryParams {
        let mut params = QueryParams::default();

        params.push("symbol", &self.symbol).push_opt("limit", self.limit);
        return params;
    }
}

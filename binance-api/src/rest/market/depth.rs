use std::borrow::Cow;

use derive_builder::Builder;
use derive_getters::Getters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rest::{endpoint::Endpoint, params::QueryParams};

/// Depths Binance accepts for `limit`.
pub const DEPTH_LIMITS: [u16; 8] = [5, 10, 20, 50, 100, 500, 1000, 5000];

/// `GET /api/v3/depth`, the order book of one symbol.
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Depth<'a> {
    #[builder(setter(into))]
    symbol: Cow<'a, str>,
    #[builder(setter(strip_option), default)]
    limit: Option<u16>,
}

impl<'a> DepthBuilder<'a> {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(limit)) = self.limit {
            if !DEPTH_LIMITS.contains(&limit) {
                return Err(format!("limit {limit} is not one of {DEPTH_LIMITS:?}"));
            }
        }
        return Ok(());
    }
}

/// Price and quantity levels, best first.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    last_update_id: i64,
    bids: Vec<(Decimal, Decimal)>,
    asks: Vec<(Decimal, Decimal)>,
}

impl<'a> Endpoint for Depth<'a> {
    fn endpoint(&self) -> Cow<'static, str> {
        return Cow::Borrowed("api/v3/depth");
    }

    fn params(&self) -> QueryParams {
        let mut params = QueryParams::default();

        params.push("symbol", &self.symbol).push_opt("limit", self.limit);
        return params;
    }
}

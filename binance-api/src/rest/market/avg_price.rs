use std::borrow::Cow;

use derive_builder::Builder;
use derive_getters::Getters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rest::{endpoint::Endpoint, params::QueryParams};

/// `GET /api/v3/avgPrice`.
#[derive(Debug, Clone, Builder)]
pub struct AvgPrice<'a> {
    #[builder(setter(into))]
    symbol: Cow<'a, str>,
}

/// Volume weighted average over the last `mins` minutes.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AveragePrice {
    mins: i64,
    price: Decimal,
    #[serde(default)]
    close_time: Option<i64>,
}

impl<'a> Endpoint for AvgPrice<'a> {
    fn endpoint(&self) -> Cow<'static, str> {
        return Cow::Borrowed("api/v3/avgPrice");
    }

    fn params(&self) -> QueryParams {
        let mut params = QueryParams::default();

        params.push("symbol", &self.symbol);
        return params;
    }
}

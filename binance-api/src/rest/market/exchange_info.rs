use std::borrow::Cow;

use derive_builder::Builder;
use derive_getters::Getters;
use serde::Deserialize;

use crate::rest::{endpoint::Endpoint, params::QueryParams};

/// `GET /api/v3/exchangeInfo`, for every symbol or only `symbols`.
#[derive(Debug, Clone, Default, Builder)]
pub struct ExchangeInfo<'a> {
    #[builder(default)]
    symbols: Vec<Cow<'a, str>>,
}

#[derive(Debug, Clone, Getters, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfoResponse {
    timezone: String,
    server_time: i64,
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Getters, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    symbol: String,
    /// `TRADING`, `BREAK`, `HALT`...
    status: String,
    base_asset: String,
    quote_asset: String,
    #[serde(default)]
    is_spot_trading_allowed: bool,
    #[serde(default)]
    is_margin_trading_allowed: bool,
}

impl<'a> Endpoint for ExchangeInfo<'a> {
    fn endpoint(&self) -> Cow<'static, str> {
        return Cow::Borrowed("api/v3/exchangeInfo");
    }

    fn params(&self) -> QueryParams {
        let mut params = QueryParams::default();

        match self.symbols.as_slice() {
            [] => {}
            [symbol] => {
                params.push("symbol", symbol);
            }
            symbols => {
                let quoted: Vec<String> = symbols.iter().map(|s| format!("\"{s}\"")).collect();
                params.push("symbols", format!("[{}]", quoted.join(",")));
            }
        }
        return params;
    }
}

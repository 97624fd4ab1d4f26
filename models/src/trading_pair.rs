use chrono::{DateTime, Utc};
use derive_builder::Builder;
use derive_getters::Getters;
use diesel::prelude::*;
use garde::Validate;
use serde::{Deserialize, Serialize};
use types::PairStatus;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::trading_pairs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TradingPair {
    id: i32,
    symbol: String,
    base_asset: String,
    quote_asset: String,
    status: PairStatus,
    is_spot_trading_allowed: bool,
    is_margin_trading_allowed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TradingPair {
    /// Copies status and capability flags from `pair`. Identity fields are untouched.
    pub fn apply_flags(&mut self, pair: &NewTradingPair, now: DateTime<Utc>) {
        self.status = pair.status;
        self.is_spot_trading_allowed = pair.is_spot_trading_allowed;
        self.is_margin_trading_allowed = pair.is_margin_trading_allowed;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Insertable, Builder, Getters, Validate, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::trading_pairs)]
pub struct NewTradingPair {
    #[garde(pattern(r"^[A-Z0-9]{2,20}$"))]
    symbol: String,
    #[garde(pattern(r"^[A-Z0-9]{1,10}$"))]
    base_asset: String,
    #[garde(pattern(r"^[A-Z0-9]{1,10}$"))]
    quote_asset: String,
    #[builder(default = "PairStatus::Active")]
    #[garde(skip)]
    status: PairStatus,
    #[builder(default = "true")]
    #[garde(skip)]
    is_spot_trading_allowed: bool,
    #[builder(default)]
    #[garde(skip)]
    is_margin_trading_allowed: bool,
}

impl NewTradingPair {
    pub fn into_trading_pair(self, id: i32, now: DateTime<Utc>) -> TradingPair {
        return TradingPair {
            id,
            symbol: self.symbol,
            base_asset: self.base_asset,
            quote_asset: self.quote_asset,
            status: self.status,
            is_spot_trading_allowed: self.is_spot_trading_allowed,
            is_margin_trading_allowed: self.is_margin_trading_allowed,
            created_at: now,
            updated_at: now,
        };
    }
}

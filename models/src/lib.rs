pub mod api_call_record;
pub mod candle;
pub mod fetch_job;
pub mod schema;
pub mod ticker_snapshot;
pub mod trading_pair;
pub mod view_schema;
pub mod views;

pub use api_call_record::{ApiCallRecord, NewApiCallRecord};
pub use candle::{Candle, CandleKey, NewCandle};
pub use fetch_job::{FetchJobSchedule, NewFetchJobSchedule};
pub use ticker_snapshot::{NewTickerSnapshot, TickerSnapshot};
pub use trading_pair::{NewTradingPair, TradingPair};
pub use views::{ApiStat, LatestCandle, LatestPrice, PriceSummary};

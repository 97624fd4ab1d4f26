pub mod error;
pub mod memory;
pub mod pg;
pub mod retention;

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use models::{
    ApiCallRecord, ApiStat, Candle, CandleKey, FetchJobSchedule, LatestCandle, LatestPrice,
    NewApiCallRecord, NewCandle, NewFetchJobSchedule, NewTickerSnapshot, NewTradingPair,
    TickerSnapshot, TradingPair,
};
use serde::Serialize;
use tracing::warn;
use types::Interval;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use retention::{
    cleanup_before, cleanup_old_data, CleanupReport, RetentionTable, DEFAULT_DAYS_TO_KEEP,
};

/// What to do when a candle with the same `(symbol, interval, open_time)` is
/// already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Keep the stored bar. Right for closed, finalized bars.
    Skip,
    /// Replace the stored bar's values. Right for the still-open bar.
    Overwrite,
    /// Fail with `StoreError::UniquenessConflict`.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Overwritten,
    Skipped,
}

/// Rows removed along with a trading pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize)]
pub struct CascadeReport {
    ticker_snapshots: usize,
    candles: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize)]
pub struct TableCounts {
    trading_pairs: i64,
    ticker_snapshots: i64,
    candles: i64,
    api_call_records: i64,
    fetch_job_schedules: i64,
}

/// Snapshot count and freshness for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct SymbolActivity {
    symbol: String,
    records: i64,
    last_update: Option<DateTime<Utc>>,
}

/// Durable storage for trading pairs, ticker snapshots, candles, API call
/// logs and fetch-job bookkeeping.
pub trait Store: Send + Sync {
    /// Inserts the pair unless its symbol is already known. An existing pair
    /// is left untouched.
    fn upsert_trading_pair(&self, pair: &NewTradingPair) -> Result<UpsertOutcome, StoreError>;

    /// Updates status and capability flags of a known pair.
    fn update_trading_pair(&self, pair: &NewTradingPair) -> Result<TradingPair, StoreError>;

    /// Deletes the pair together with its snapshots and candles.
    fn delete_trading_pair(&self, symbol: &str) -> Result<CascadeReport, StoreError>;

    fn get_trading_pair(&self, symbol: &str) -> Result<Option<TradingPair>, StoreError>;

    fn list_trading_pairs(&self, active_only: bool) -> Result<Vec<TradingPair>, StoreError>;

    fn insert_ticker_snapshot(
        &self,
        snapshot: &NewTickerSnapshot,
    ) -> Result<TickerSnapshot, StoreError>;

    /// Newest first.
    fn symbol_history(&self, symbol: &str, limit: i64) -> Result<Vec<TickerSnapshot>, StoreError>;

    fn upsert_candle(
        &self,
        candle: &NewCandle,
        policy: ConflictPolicy,
    ) -> Result<UpsertOutcome, StoreError>;

    fn get_candle(&self, key: &CandleKey) -> Result<Option<Candle>, StoreError>;

    /// Bars with `start <= open_time <= end`, oldest first.
    fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        start: i64,
        end: i64,
    ) -> Result<Vec<Candle>, StoreError>;

    fn try_log_api_call(&self, record: &NewApiCallRecord) -> Result<ApiCallRecord, StoreError>;

    /// Records an outbound call. Never fails: a lost record is only worth a
    /// warning, not the fetch it describes.
    fn log_api_call(&self, record: &NewApiCallRecord) {
        if let Err(err) = self.try_log_api_call(record) {
            warn!(
                "Dropping api call record for {}: {:#}",
                record.endpoint(),
                anyhow::Error::from(err)
            );
        }
    }

    /// Inserts the job, or updates its schedule, status and counters.
    fn upsert_fetch_job(&self, job: &NewFetchJobSchedule) -> Result<FetchJobSchedule, StoreError>;

    fn get_fetch_job(&self, job_name: &str) -> Result<Option<FetchJobSchedule>, StoreError>;

    fn list_fetch_jobs(&self) -> Result<Vec<FetchJobSchedule>, StoreError>;

    /// Most recent snapshot per symbol, ordered by symbol.
    fn latest_prices(&self) -> Result<Vec<LatestPrice>, StoreError>;

    /// Most recent bar per symbol and interval, ordered by symbol then interval.
    fn latest_candles(&self) -> Result<Vec<LatestCandle>, StoreError>;

    /// Per endpoint call statistics, busiest endpoint first.
    fn api_stats(&self) -> Result<Vec<ApiStat>, StoreError>;

    fn table_counts(&self) -> Result<TableCounts, StoreError>;

    /// Symbols with at least one snapshot, most recorded first.
    fn symbol_activity(&self) -> Result<Vec<SymbolActivity>, StoreError>;

    /// Deletes rows of `table` whose retention timestamp is strictly before
    /// `cutoff`. See `RetentionTable` for which timestamp that is.
    fn delete_older_than(
        &self,
        table: RetentionTable,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError>;
}

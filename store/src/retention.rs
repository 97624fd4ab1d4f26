use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use serde::Serialize;
use tracing::{error, info};

use crate::{Store, StoreError};

pub const DEFAULT_DAYS_TO_KEEP: i64 = 30;

/// Time-series tables subject to retention, in the order they are pruned.
///
/// Snapshots age by their observation `timestamp`; candles and API call
/// records age by `created_at`, when the row was stored. A backfilled candle
/// therefore lives a full retention window even if it describes last year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionTable {
    TickerSnapshots,
    Candles,
    ApiCallRecords,
}

impl RetentionTable {
    pub const ALL: [RetentionTable; 3] = [
        RetentionTable::TickerSnapshots,
        RetentionTable::Candles,
        RetentionTable::ApiCallRecords,
    ];

    pub fn table_name(&self) -> &'static str {
        return match self {
            RetentionTable::TickerSnapshots => "ticker_snapshots",
            RetentionTable::Candles => "candles",
            RetentionTable::ApiCallRecords => "api_call_records",
        };
    }
}

impl std::fmt::Display for RetentionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", self.table_name());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize)]
pub struct TableCleanup {
    table: RetentionTable,
    rows_deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct TableFailure {
    table: RetentionTable,
    error: String,
}

/// Rows deleted per table, in `RetentionTable::ALL` order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize)]
pub struct CleanupReport {
    entries: Vec<TableCleanup>,
}

impl CleanupReport {
    pub fn rows_deleted(&self, table: RetentionTable) -> Option<usize> {
        return self
            .entries
            .iter()
            .find(|entry| entry.table == table)
            .map(|entry| entry.rows_deleted);
    }

    pub fn total(&self) -> usize {
        return self.entries.iter().map(|entry| entry.rows_deleted).sum();
    }
}

/// Deletes time-series rows older than `days_to_keep` days. Trading pairs and
/// fetch jobs are never pruned.
pub fn cleanup_old_data<S: Store + ?Sized>(
    store: &S,
    days_to_keep: i64,
) -> Result<CleanupReport, StoreError> {
    const OPERATION: &str = "cleanup_old_data";
    let key = format!("days_to_keep={days_to_keep}");
    if days_to_keep < 0 {
        return Err(StoreError::invalid(OPERATION, &key, "must not be negative"));
    }
    let cutoff = TimeDelta::try_days(days_to_keep)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| StoreError::invalid(OPERATION, &key, "retention window out of range"))?;

    return cleanup_before(store, cutoff);
}

/// Prunes each retention table independently. A failing table does not stop
/// the others and completed deletions are kept; failures come back as
/// `StoreError::PartialCleanup`.
pub fn cleanup_before<S: Store + ?Sized>(
    store: &S,
    cutoff: DateTime<Utc>,
) -> Result<CleanupReport, StoreError> {
    let mut report = CleanupReport::default();
    let mut failed = Vec::new();

    for table in RetentionTable::ALL {
        match store.delete_older_than(table, cutoff) {
            Ok(rows_deleted) => {
                info!("Deleted {rows_deleted} rows from {table} older than {cutoff}");
                report.entries.push(TableCleanup {
                    table,
                    rows_deleted,
                });
            }
            Err(err) => {
                let err = anyhow::Error::from(err);
                error!("Cleanup of {table} failed: {err:#}");
                failed.push(TableFailure {
                    table,
                    error: format!("{err:#}"),
                });
            }
        }
    }

    if !failed.is_empty() {
        return Err(StoreError::PartialCleanup { report, failed });
    }
    return Ok(report);
}

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use garde::Validate;
use models::{
    ApiCallRecord, ApiStat, Candle, CandleKey, FetchJobSchedule, LatestCandle, LatestPrice,
    NewApiCallRecord, NewCandle, NewFetchJobSchedule, NewTickerSnapshot, NewTradingPair,
    TickerSnapshot, TradingPair,
};
use parking_lot::RwLock;
use rust_decimal::{Decimal, RoundingStrategy};
use types::{Interval, PairStatus};

use crate::{
    CascadeReport, ConflictPolicy, RetentionTable, Store, StoreError, SymbolActivity, TableCounts,
    UpsertOutcome,
};

/// A trading pair and everything that references it. Dropping the entry is the
/// cascade.
#[derive(Debug)]
struct PairEntry {
    pair: TradingPair,
    snapshots: Vec<TickerSnapshot>,
    candles: BTreeMap<(Interval, i64), Candle>,
}

#[derive(Debug, Default)]
struct Inner {
    pairs: BTreeMap<String, PairEntry>,
    api_calls: Vec<ApiCallRecord>,
    jobs: BTreeMap<String, FetchJobSchedule>,
    last_pair_id: i32,
    last_snapshot_id: i64,
    last_candle_id: i64,
    last_api_call_id: i64,
    last_job_id: i32,
}

impl Inner {
    fn entry_mut(&mut self, operation: &'static str, symbol: &str) -> Result<&mut PairEntry, StoreError> {
        return self.pairs.get_mut(symbol).ok_or_else(|| StoreError::UnknownSymbol {
            operation,
            symbol: symbol.to_owned(),
        });
    }
}

/// Process-local `Store`. Same semantics as `PgStore`, nothing survives a
/// restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        return Self::default();
    }
}

impl Store for MemoryStore {
    fn upsert_trading_pair(&self, pair: &NewTradingPair) -> Result<UpsertOutcome, StoreError> {
        const OPERATION: &str = "upsert_trading_pair";
        pair.validate(&())
            .map_err(|report| StoreError::invalid(OPERATION, pair.symbol(), report))?;

        let mut inner = self.inner.write();
        if inner.pairs.contains_key(pair.symbol()) {
            return Ok(UpsertOutcome::Skipped);
        }
        inner.last_pair_id += 1;
        let row = pair.clone().into_trading_pair(inner.last_pair_id, Utc::now());
        inner.pairs.insert(
            pair.symbol().to_owned(),
            PairEntry {
                pair: row,
                snapshots: Vec::new(),
                candles: BTreeMap::new(),
            },
        );
        return Ok(UpsertOutcome::Inserted);
    }

    fn update_trading_pair(&self, pair: &NewTradingPair) -> Result<TradingPair, StoreError> {
        const OPERATION: &str = "update_trading_pair";
        pair.validate(&())
            .map_err(|report| StoreError::invalid(OPERATION, pair.symbol(), report))?;

        let mut inner = self.inner.write();
        let entry = inner.entry_mut(OPERATION, pair.symbol())?;
        entry.pair.apply_flags(pair, Utc::now());
        return Ok(entry.pair.clone());
    }

    fn delete_trading_pair(&self, symbol: &str) -> Result<CascadeReport, StoreError> {
        let entry = self
            .inner
            .write()
            .pairs
            .remove(symbol)
            .ok_or_else(|| StoreError::UnknownSymbol {
                operation: "delete_trading_pair",
                symbol: symbol.to_owned(),
            })?;
        return Ok(CascadeReport {
            ticker_snapshots: entry.snapshots.len(),
            candles: entry.candles.len(),
        });
    }

    fn get_trading_pair(&self, symbol: &str) -> Result<Option<TradingPair>, StoreError> {
        return Ok(self
            .inner
            .read()
            .pairs
            .get(symbol)
            .map(|entry| entry.pair.clone()));
    }

    fn list_trading_pairs(&self, active_only: bool) -> Result<Vec<TradingPair>, StoreError> {
        return Ok(self
            .inner
            .read()
            .pairs
            .values()
            .filter(|entry| !active_only || *entry.pair.status() == PairStatus::Active)
            .map(|entry| entry.pair.clone())
            .collect());
    }

    fn insert_ticker_snapshot(
        &self,
        snapshot: &NewTickerSnapshot,
    ) -> Result<TickerSnapshot, StoreError> {
        const OPERATION: &str = "insert_ticker_snapshot";
        snapshot
            .validate(&())
            .map_err(|report| StoreError::invalid(OPERATION, snapshot.symbol(), report))?;

        let mut inner = self.inner.write();
        let id = inner.last_snapshot_id + 1;
        let entry = inner.entry_mut(OPERATION, snapshot.symbol())?;
        let row = snapshot.clone().into_ticker_snapshot(id);
        entry.snapshots.push(row.clone());
        inner.last_snapshot_id = id;
        return Ok(row);
    }

    fn symbol_history(&self, symbol: &str, limit: i64) -> Result<Vec<TickerSnapshot>, StoreError> {
        if limit < 0 {
            return Err(StoreError::invalid(
                "symbol_history",
                symbol,
                format!("limit {limit} must not be negative"),
            ));
        }
        let inner = self.inner.read();
        let Some(entry) = inner.pairs.get(symbol) else {
            return Ok(Vec::new());
        };
        let mut history = entry.snapshots.clone();
        history.sort_by(|a, b| b.timestamp().cmp(a.timestamp()).then(b.id().cmp(a.id())));
        history.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        return Ok(history);
    }

    fn upsert_candle(
        &self,
        candle: &NewCandle,
        policy: ConflictPolicy,
    ) -> Result<UpsertOutcome, StoreError> {
        const OPERATION: &str = "upsert_candle";
        let key = candle.key();
        candle
            .check()
            .map_err(|reason| StoreError::invalid(OPERATION, &key.to_string(), reason))?;

        let mut inner = self.inner.write();
        let id = inner.last_candle_id + 1;
        let entry = inner.entry_mut(OPERATION, candle.symbol())?;
        let slot = (*candle.interval(), *candle.open_time());
        if let Some(existing) = entry.candles.get_mut(&slot) {
            return match policy {
                ConflictPolicy::Skip => Ok(UpsertOutcome::Skipped),
                ConflictPolicy::Overwrite => {
                    existing.overwrite_with(candle);
                    Ok(UpsertOutcome::Overwritten)
                }
                ConflictPolicy::Reject => Err(StoreError::UniquenessConflict {
                    operation: OPERATION,
                    key,
                }),
            };
        }
        entry
            .candles
            .insert(slot, candle.clone().into_candle(id, Utc::now()));
        inner.last_candle_id = id;
        return Ok(UpsertOutcome::Inserted);
    }

    fn get_candle(&self, key: &CandleKey) -> Result<Option<Candle>, StoreError> {
        return Ok(self.inner.read().pairs.get(key.symbol()).and_then(|entry| {
            entry
                .candles
                .get(&(*key.interval(), *key.open_time()))
                .cloned()
        }));
    }

    fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        start: i64,
        end: i64,
    ) -> Result<Vec<Candle>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }
        let inner = self.inner.read();
        let Some(entry) = inner.pairs.get(symbol) else {
            return Ok(Vec::new());
        };
        return Ok(entry
            .candles
            .range((interval, start)..=(interval, end))
            .map(|(_, candle)| candle.clone())
            .collect());
    }

    fn try_log_api_call(&self, record: &NewApiCallRecord) -> Result<ApiCallRecord, StoreError> {
        if record.endpoint().is_empty() {
            return Err(StoreError::invalid("log_api_call", "", "endpoint is empty"));
        }
        let mut inner = self.inner.write();
        inner.last_api_call_id += 1;
        let row = record
            .clone()
            .into_api_call_record(inner.last_api_call_id, Utc::now());
        inner.api_calls.push(row.clone());
        return Ok(row);
    }

    fn upsert_fetch_job(&self, job: &NewFetchJobSchedule) -> Result<FetchJobSchedule, StoreError> {
        if job.job_name().is_empty() {
            return Err(StoreError::invalid("upsert_fetch_job", "", "job name is empty"));
        }
        let mut inner = self.inner.write();
        let now = Utc::now();
        if let Some(existing) = inner.jobs.get_mut(job.job_name()) {
            existing.apply(job, now);
            return Ok(existing.clone());
        }
        inner.last_job_id += 1;
        let row = job.clone().into_fetch_job_schedule(inner.last_job_id, now);
        inner.jobs.insert(job.job_name().to_owned(), row.clone());
        return Ok(row);
    }

    fn get_fetch_job(&self, job_name: &str) -> Result<Option<FetchJobSchedule>, StoreError> {
        return Ok(self.inner.read().jobs.get(job_name).cloned());
    }

    fn list_fetch_jobs(&self) -> Result<Vec<FetchJobSchedule>, StoreError> {
        return Ok(self.inner.read().jobs.values().cloned().collect());
    }

    fn latest_prices(&self) -> Result<Vec<LatestPrice>, StoreError> {
        let inner = self.inner.read();
        // pairs is a BTreeMap, so rows come out ordered by symbol
        return Ok(inner
            .pairs
            .values()
            .filter_map(|entry| {
                entry
                    .snapshots
                    .iter()
                    .max_by(|a, b| a.timestamp().cmp(b.timestamp()).then(a.id().cmp(b.id())))
            })
            .map(LatestPrice::from)
            .collect());
    }

    fn latest_candles(&self) -> Result<Vec<LatestCandle>, StoreError> {
        let inner = self.inner.read();
        let mut rows = Vec::new();
        for entry in inner.pairs.values() {
            let mut newest: BTreeMap<Interval, &Candle> = BTreeMap::new();
            for ((interval, _), candle) in &entry.candles {
                // keys ascend by open_time within an interval, so the last one wins
                newest.insert(*interval, candle);
            }
            for candle in newest.values() {
                let row = LatestCandle::from_candle(candle).ok_or_else(|| {
                    StoreError::invalid(
                        "latest_candles",
                        &candle.key().to_string(),
                        "open or close time out of range",
                    )
                })?;
                rows.push(row);
            }
        }
        rows.sort_by(|a, b| {
            a.symbol()
                .cmp(b.symbol())
                .then_with(|| a.interval().as_str().cmp(b.interval().as_str()))
        });
        return Ok(rows);
    }

    fn api_stats(&self) -> Result<Vec<ApiStat>, StoreError> {
        struct Acc {
            total: i64,
            ok: i64,
            latency_sum: i64,
            last_call: DateTime<Utc>,
        }

        let inner = self.inner.read();
        let mut per_endpoint: HashMap<&str, Acc> = HashMap::new();
        for call in &inner.api_calls {
            let acc = per_endpoint.entry(call.endpoint().as_str()).or_insert(Acc {
                total: 0,
                ok: 0,
                latency_sum: 0,
                last_call: *call.created_at(),
            });
            acc.total += 1;
            if *call.success() {
                acc.ok += 1;
            }
            acc.latency_sum += i64::from(*call.response_time_ms());
            acc.last_call = acc.last_call.max(*call.created_at());
        }

        let mut stats: Vec<ApiStat> = per_endpoint
            .into_iter()
            .map(|(endpoint, acc)| {
                let avg = (Decimal::from(acc.latency_sum) / Decimal::from(acc.total))
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                return ApiStat::new(
                    endpoint.to_owned(),
                    acc.total,
                    acc.ok,
                    acc.total - acc.ok,
                    Some(avg),
                    acc.last_call,
                );
            })
            .collect();
        stats.sort_by(|a, b| {
            b.total_calls()
                .cmp(a.total_calls())
                .then_with(|| a.endpoint().cmp(b.endpoint()))
        });
        return Ok(stats);
    }

    fn table_counts(&self) -> Result<TableCounts, StoreError> {
        let inner = self.inner.read();
        let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        return Ok(TableCounts {
            trading_pairs: count(inner.pairs.len()),
            ticker_snapshots: count(inner.pairs.values().map(|e| e.snapshots.len()).sum()),
            candles: count(inner.pairs.values().map(|e| e.candles.len()).sum()),
            api_call_records: count(inner.api_calls.len()),
            fetch_job_schedules: count(inner.jobs.len()),
        });
    }

    fn symbol_activity(&self) -> Result<Vec<SymbolActivity>, StoreError> {
        let inner = self.inner.read();
        let mut activity: Vec<SymbolActivity> = inner
            .pairs
            .iter()
            .filter(|(_, entry)| !entry.snapshots.is_empty())
            .map(|(symbol, entry)| SymbolActivity {
                symbol: symbol.clone(),
                records: i64::try_from(entry.snapshots.len()).unwrap_or(i64::MAX),
                last_update: entry.snapshots.iter().map(|s| *s.timestamp()).max(),
            })
            .collect();
        activity.sort_by(|a, b| b.records.cmp(&a.records).then_with(|| a.symbol.cmp(&b.symbol)));
        return Ok(activity);
    }

    fn delete_older_than(
        &self,
        table: RetentionTable,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.write();
        let deleted = match table {
            RetentionTable::TickerSnapshots => inner
                .pairs
                .values_mut()
                .map(|entry| {
                    let before = entry.snapshots.len();
                    entry.snapshots.retain(|s| *s.timestamp() >= cutoff);
                    before - entry.snapshots.len()
                })
                .sum::<usize>(),
            RetentionTable::Candles => inner
                .pairs
                .values_mut()
                .map(|entry| {
                    let before = entry.candles.len();
                    entry.candles.retain(|_, c| *c.created_at() >= cutoff);
                    before - entry.candles.len()
                })
                .sum::<usize>(),
            RetentionTable::ApiCallRecords => {
                let before = inner.api_calls.len();
                inner.api_calls.retain(|c| *c.created_at() >= cutoff);
                before - inner.api_calls.len()
            }
        };
        return Ok(deleted);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, Utc};
    use models::{
        api_call_record::NewApiCallRecordBuilder, candle::NewCandleBuilder,
        fetch_job::NewFetchJobScheduleBuilder, ticker_snapshot::NewTickerSnapshotBuilder,
        trading_pair::NewTradingPairBuilder, CandleKey, NewCandle, NewTradingPair,
    };
    use rust_decimal::Decimal;
    use types::{Interval, JobStatus, PairStatus};

    use super::MemoryStore;
    use crate::{cleanup_old_data, ConflictPolicy, RetentionTable, Store, StoreError, UpsertOutcome};

    fn xbtest() -> NewTradingPair {
        return NewTradingPairBuilder::default()
            .symbol("XBTEST".to_owned())
            .base_asset("XBT".to_owned())
            .quote_asset("TEST".to_owned())
            .build()
            .unwrap();
    }

    fn store_with_pair() -> MemoryStore {
        let store = MemoryStore::new();
        assert_eq!(store.upsert_trading_pair(&xbtest()).unwrap(), UpsertOutcome::Inserted);
        return store;
    }

    fn snapshot(store: &MemoryStore, symbol: &str, price: i64, at: DateTime<Utc>) {
        store
            .insert_ticker_snapshot(
                &NewTickerSnapshotBuilder::default()
                    .symbol(symbol.to_owned())
                    .price(Decimal::from(price))
                    .timestamp(at)
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }

    fn candle(symbol: &str, open_time: i64, close: i64) -> NewCandle {
        return NewCandleBuilder::default()
            .symbol(symbol.to_owned())
            .interval(Interval::OneHour)
            .open_time(open_time)
            .open_price(Decimal::from(100))
            .high_price(Decimal::from(110))
            .low_price(Decimal::from(95))
            .close_price(Decimal::from(close))
            .volume(Decimal::from(10))
            .close_time(open_time + 4_599_000)
            .build()
            .unwrap();
    }

    fn key() -> CandleKey {
        return CandleKey::new("XBTEST", Interval::OneHour, 1000);
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let store = store_with_pair();
        let err = store
            .insert_ticker_snapshot(
                &NewTickerSnapshotBuilder::default()
                    .symbol("NOPE".to_owned())
                    .price(Decimal::ONE)
                    .build()
                    .unwrap(),
            )
            .expect_err("snapshot for unknown symbol");
        assert!(matches!(err, StoreError::UnknownSymbol { .. }));

        let err = store
            .upsert_candle(&candle("NOPE", 1000, 105), ConflictPolicy::Skip)
            .expect_err("candle for unknown symbol");
        assert!(matches!(err, StoreError::UnknownSymbol { .. }));
        assert_eq!(*store.table_counts().unwrap().ticker_snapshots(), 0);
        assert_eq!(*store.table_counts().unwrap().candles(), 0);
    }

    #[test]
    fn pair_upsert_is_idempotent_and_keeps_flags() {
        let store = store_with_pair();
        let inactive = NewTradingPairBuilder::default()
            .symbol("XBTEST".to_owned())
            .base_asset("XBT".to_owned())
            .quote_asset("TEST".to_owned())
            .status(PairStatus::Inactive)
            .is_margin_trading_allowed(true)
            .build()
            .unwrap();

        assert_eq!(store.upsert_trading_pair(&inactive).unwrap(), UpsertOutcome::Skipped);
        let pairs = store.list_trading_pairs(false).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(*pairs[0].status(), PairStatus::Active);
        assert!(!pairs[0].is_margin_trading_allowed());

        let updated = store.update_trading_pair(&inactive).unwrap();
        assert_eq!(*updated.status(), PairStatus::Inactive);
        assert!(*updated.is_margin_trading_allowed());
        assert_eq!(updated.id(), pairs[0].id());
        assert!(store.list_trading_pairs(true).unwrap().is_empty());
    }

    #[test]
    fn invalid_pair_is_rejected_before_write() {
        let store = MemoryStore::new();
        let bad = NewTradingPairBuilder::default()
            .symbol("btc-usdt".to_owned())
            .base_asset("BTC".to_owned())
            .quote_asset("USDT".to_owned())
            .build()
            .unwrap();
        let err = store.upsert_trading_pair(&bad).expect_err("lowercase symbol");
        assert!(matches!(err, StoreError::Invalid { .. }));
        assert_eq!(*store.table_counts().unwrap().trading_pairs(), 0);
    }

    #[test]
    fn update_unknown_pair_fails() {
        let store = MemoryStore::new();
        let err = store.update_trading_pair(&xbtest()).expect_err("no such pair");
        assert!(matches!(err, StoreError::UnknownSymbol { .. }));
    }

    #[test]
    fn latest_price_is_the_newest_snapshot() {
        let store = store_with_pair();
        let t1 = Utc::now() - TimeDelta::minutes(2);
        let t2 = Utc::now() - TimeDelta::minutes(1);
        snapshot(&store, "XBTEST", 100, t1);
        snapshot(&store, "XBTEST", 105, t2);

        let latest = store.latest_prices().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].symbol(), "XBTEST");
        assert_eq!(*latest[0].price(), Decimal::from(105));
        assert_eq!(*latest[0].timestamp(), t2);
    }

    #[test]
    fn latest_price_ignores_insertion_order() {
        let store = store_with_pair();
        let t1 = Utc::now() - TimeDelta::minutes(2);
        let t2 = Utc::now() - TimeDelta::minutes(1);
        snapshot(&store, "XBTEST", 105, t2);
        snapshot(&store, "XBTEST", 100, t1);

        let latest = store.latest_prices().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(*latest[0].timestamp(), t2);
        assert_eq!(*latest[0].price(), Decimal::from(105));
    }

    #[test]
    fn one_latest_price_per_symbol() {
        let store = store_with_pair();
        store
            .upsert_trading_pair(
                &NewTradingPairBuilder::default()
                    .symbol("ABTEST".to_owned())
                    .base_asset("AB".to_owned())
                    .quote_asset("TEST".to_owned())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let now = Utc::now();
        for minutes in 1..4 {
            snapshot(&store, "XBTEST", 100 + minutes, now - TimeDelta::minutes(minutes));
            snapshot(&store, "ABTEST", 10 + minutes, now - TimeDelta::minutes(minutes));
        }

        let latest = store.latest_prices().unwrap();
        let symbols: Vec<&str> = latest.iter().map(|row| row.symbol().as_str()).collect();
        assert_eq!(symbols, ["ABTEST", "XBTEST"]);
        assert!(latest.iter().all(|row| *row.timestamp() == now - TimeDelta::minutes(1)));
    }

    #[test]
    fn candle_overwrite_replaces_values() {
        let store = store_with_pair();
        let first = candle("XBTEST", 1000, 105);
        assert_eq!(*first.close_time(), 4_600_000);
        assert_eq!(
            store.upsert_candle(&first, ConflictPolicy::Overwrite).unwrap(),
            UpsertOutcome::Inserted
        );
        let stored = store.get_candle(&key()).unwrap().unwrap();

        assert_eq!(
            store
                .upsert_candle(&candle("XBTEST", 1000, 108), ConflictPolicy::Overwrite)
                .unwrap(),
            UpsertOutcome::Overwritten
        );
        let reread = store.get_candle(&key()).unwrap().unwrap();
        assert_eq!(*reread.close_price(), Decimal::from(108));
        assert_eq!(reread.id(), stored.id());
        assert_eq!(reread.created_at(), stored.created_at());
        assert_eq!(store.candles("XBTEST", Interval::OneHour, 0, i64::MAX).unwrap().len(), 1);
    }

    #[test]
    fn candle_skip_keeps_first_write() {
        let store = store_with_pair();
        store
            .upsert_candle(&candle("XBTEST", 1000, 105), ConflictPolicy::Skip)
            .unwrap();
        assert_eq!(
            store
                .upsert_candle(&candle("XBTEST", 1000, 108), ConflictPolicy::Skip)
                .unwrap(),
            UpsertOutcome::Skipped
        );
        let stored = store.get_candle(&key()).unwrap().unwrap();
        assert_eq!(*stored.close_price(), Decimal::from(105));
        assert_eq!(*store.table_counts().unwrap().candles(), 1);
    }

    #[test]
    fn candle_reject_surfaces_conflict() {
        let store = store_with_pair();
        store
            .upsert_candle(&candle("XBTEST", 1000, 105), ConflictPolicy::Reject)
            .unwrap();
        let err = store
            .upsert_candle(&candle("XBTEST", 1000, 108), ConflictPolicy::Reject)
            .expect_err("duplicate key");
        let StoreError::UniquenessConflict { key: conflict, .. } = err else {
            panic!("expected UniquenessConflict, got {err:?}");
        };
        assert_eq!(conflict, key());
    }

    #[test]
    fn malformed_candle_is_invalid() {
        let store = store_with_pair();
        let bad = NewCandleBuilder::default()
            .symbol("XBTEST".to_owned())
            .interval(Interval::OneHour)
            .open_time(5000)
            .open_price(Decimal::ONE)
            .high_price(Decimal::ONE)
            .low_price(Decimal::ONE)
            .close_price(Decimal::ONE)
            .volume(Decimal::ONE)
            .close_time(10)
            .build()
            .unwrap();
        let err = store
            .upsert_candle(&bad, ConflictPolicy::Skip)
            .expect_err("close before open");
        assert!(matches!(err, StoreError::Invalid { .. }));
    }

    #[test]
    fn candle_range_is_inclusive_and_ascending() {
        let store = store_with_pair();
        for open_time in [3_600_000, 0, 7_200_000] {
            store
                .upsert_candle(&candle("XBTEST", open_time, 105), ConflictPolicy::Skip)
                .unwrap();
        }
        let range = store
            .candles("XBTEST", Interval::OneHour, 0, 3_600_000)
            .unwrap();
        let opens: Vec<i64> = range.iter().map(|c| *c.open_time()).collect();
        assert_eq!(opens, [0, 3_600_000]);
        assert!(store.candles("XBTEST", Interval::OneDay, 0, i64::MAX).unwrap().is_empty());
    }

    #[test]
    fn latest_candles_one_row_per_interval() {
        let store = store_with_pair();
        store
            .upsert_candle(&candle("XBTEST", 0, 101), ConflictPolicy::Skip)
            .unwrap();
        store
            .upsert_candle(&candle("XBTEST", 3_600_000, 102), ConflictPolicy::Skip)
            .unwrap();
        let daily = NewCandleBuilder::default()
            .symbol("XBTEST".to_owned())
            .interval(Interval::OneDay)
            .open_time(0)
            .open_price(Decimal::ONE)
            .high_price(Decimal::ONE)
            .low_price(Decimal::ONE)
            .close_price(Decimal::ONE)
            .volume(Decimal::ONE)
            .close_time(86_399_999)
            .build()
            .unwrap();
        store.upsert_candle(&daily, ConflictPolicy::Skip).unwrap();

        let latest = store.latest_candles().unwrap();
        assert_eq!(latest.len(), 2);
        // ordered by interval text: "1d" < "1h"
        assert_eq!(*latest[0].interval(), Interval::OneDay);
        assert_eq!(*latest[1].interval(), Interval::OneHour);
        assert_eq!(*latest[1].close_price(), Decimal::from(102));
        assert_eq!(latest[1].open_time().timestamp_millis(), 3_600_000);
    }

    #[test]
    fn delete_pair_cascades() {
        let store = store_with_pair();
        snapshot(&store, "XBTEST", 100, Utc::now());
        store
            .upsert_candle(&candle("XBTEST", 1000, 105), ConflictPolicy::Skip)
            .unwrap();

        let report = store.delete_trading_pair("XBTEST").unwrap();
        assert_eq!(*report.ticker_snapshots(), 1);
        assert_eq!(*report.candles(), 1);
        assert!(store.get_candle(&key()).unwrap().is_none());
        assert!(store.latest_prices().unwrap().is_empty());

        // re-adding the pair does not resurrect its data
        store.upsert_trading_pair(&xbtest()).unwrap();
        assert!(store.symbol_history("XBTEST", 10).unwrap().is_empty());
        assert!(matches!(
            store.delete_trading_pair("NOPE"),
            Err(StoreError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let store = store_with_pair();
        let now = Utc::now();
        for (minutes, price) in [(3, 100), (1, 102), (2, 101)] {
            snapshot(&store, "XBTEST", price, now - TimeDelta::minutes(minutes));
        }
        let history = store.symbol_history("XBTEST", 2).unwrap();
        let prices: Vec<Decimal> = history.iter().map(|s| *s.price()).collect();
        assert_eq!(prices, [Decimal::from(102), Decimal::from(101)]);
        assert!(store.symbol_history("XBTEST", -1).is_err());
    }

    #[test]
    fn api_stats_aggregate_per_endpoint() {
        let store = MemoryStore::new();
        for (endpoint, latency, success) in [
            ("/api/v3/klines", 10, true),
            ("/api/v3/klines", 11, true),
            ("/api/v3/klines", 12, false),
            ("/api/v3/ping", 5, true),
            ("/api/v3/ping", 6, true),
            ("/api/v3/time", 1, true),
        ] {
            store.log_api_call(
                &NewApiCallRecordBuilder::default()
                    .endpoint(endpoint.to_owned())
                    .response_time_ms(latency)
                    .success(success)
                    .build()
                    .unwrap(),
            );
        }

        let stats = store.api_stats().unwrap();
        let endpoints: Vec<&str> = stats.iter().map(|s| s.endpoint().as_str()).collect();
        assert_eq!(endpoints, ["/api/v3/klines", "/api/v3/ping", "/api/v3/time"]);
        assert_eq!(*stats[0].total_calls(), 3);
        assert_eq!(*stats[0].successful_calls(), 2);
        assert_eq!(*stats[0].failed_calls(), 1);
        assert_eq!(*stats[0].avg_response_time_ms(), Some(Decimal::from(11)));
        // 5.5 stays 5.5
        assert_eq!(*stats[1].avg_response_time_ms(), Some(Decimal::new(55, 1)));
    }

    #[test]
    fn api_stats_round_half_away_from_zero() {
        let store = MemoryStore::new();
        // 4 / 3 rounds down to 1.33
        for latency in [1, 1, 2] {
            store.log_api_call(
                &NewApiCallRecordBuilder::default()
                    .endpoint("/api/v3/time".to_owned())
                    .response_time_ms(latency)
                    .success(true)
                    .build()
                    .unwrap(),
            );
        }
        // 0.125 rounds to 0.13
        for latency in [0, 0, 0, 0, 0, 0, 0, 1] {
            store.log_api_call(
                &NewApiCallRecordBuilder::default()
                    .endpoint("/api/v3/ping".to_owned())
                    .response_time_ms(latency)
                    .success(true)
                    .build()
                    .unwrap(),
            );
        }
        let stats = store.api_stats().unwrap();
        assert_eq!(stats[0].endpoint(), "/api/v3/ping");
        assert_eq!(*stats[0].avg_response_time_ms(), Some(Decimal::new(13, 2)));
        assert_eq!(*stats[1].avg_response_time_ms(), Some(Decimal::new(133, 2)));
    }

    #[test]
    fn api_call_needs_an_endpoint() {
        let store = MemoryStore::new();
        let record = NewApiCallRecordBuilder::default()
            .endpoint(String::new())
            .response_time_ms(3)
            .success(true)
            .build()
            .unwrap();
        let err = store.try_log_api_call(&record).unwrap_err();
        assert!(matches!(err, StoreError::Invalid { .. }));
        assert!(store.api_stats().unwrap().is_empty());
    }

    #[test]
    fn fetch_job_upsert_updates_in_place() {
        let store = MemoryStore::new();
        let job = NewFetchJobScheduleBuilder::default()
            .job_name("prices".to_owned())
            .interval_seconds(60)
            .build()
            .unwrap();
        let inserted = store.upsert_fetch_job(&job).unwrap();
        assert_eq!(*inserted.status(), JobStatus::Pending);

        let ran_at = Utc::now();
        let done = NewFetchJobScheduleBuilder::default()
            .job_name("prices".to_owned())
            .interval_seconds(60)
            .last_run(Some(ran_at))
            .status(JobStatus::Completed)
            .total_runs(1)
            .successful_runs(1)
            .build()
            .unwrap();
        let updated = store.upsert_fetch_job(&done).unwrap();
        assert_eq!(updated.id(), inserted.id());
        assert_eq!(*updated.last_run(), Some(ran_at));
        assert_eq!(*updated.total_runs(), 1);
        assert_eq!(store.list_fetch_jobs().unwrap().len(), 1);
        assert_eq!(
            store.get_fetch_job("prices").unwrap().unwrap().status(),
            &JobStatus::Completed
        );
    }

    #[test]
    fn symbol_activity_most_recorded_first() {
        let store = store_with_pair();
        store
            .upsert_trading_pair(
                &NewTradingPairBuilder::default()
                    .symbol("ABTEST".to_owned())
                    .base_asset("AB".to_owned())
                    .quote_asset("TEST".to_owned())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let now = Utc::now();
        snapshot(&store, "XBTEST", 1, now - TimeDelta::minutes(1));
        snapshot(&store, "XBTEST", 2, now);
        snapshot(&store, "ABTEST", 3, now);

        let activity = store.symbol_activity().unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].symbol(), "XBTEST");
        assert_eq!(*activity[0].records(), 2);
        assert_eq!(*activity[0].last_update(), Some(now));
    }

    #[test]
    fn cleanup_thirty_days_twice() {
        let store = store_with_pair();
        snapshot(&store, "XBTEST", 100, Utc::now() - TimeDelta::days(31));
        snapshot(&store, "XBTEST", 105, Utc::now());

        let first = cleanup_old_data(&store, 30).unwrap();
        assert_eq!(first.rows_deleted(RetentionTable::TickerSnapshots), Some(1));
        let second = cleanup_old_data(&store, 30).unwrap();
        for table in RetentionTable::ALL {
            assert_eq!(second.rows_deleted(table), Some(0));
        }
        assert_eq!(*store.table_counts().unwrap().ticker_snapshots(), 1);
    }
}

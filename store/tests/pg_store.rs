//! Runs the store scenarios against a real PostgreSQL. The tests are ignored
//! by default: run them with `cargo test -p store -- --ignored` and
//! `TEST_DATABASE_URL` pointing at a scratch database. The schema is applied
//! on first use and `cleanup` empties the time-series tables.

use chrono::{TimeDelta, Utc};
use models::{
    api_call_record::NewApiCallRecordBuilder, candle::NewCandleBuilder,
    fetch_job::NewFetchJobScheduleBuilder, ticker_snapshot::NewTickerSnapshotBuilder,
    trading_pair::NewTradingPairBuilder, CandleKey, NewCandle,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use store::{
    cleanup_before, cleanup_old_data, ConflictPolicy, PgStore, RetentionTable, Store, StoreError,
    UpsertOutcome,
};
use types::{Interval, JobStatus, PairStatus};

// Cleanup touches every row, so the tests take turns.
static DB: Mutex<()> = Mutex::new(());

fn store() -> PgStore {
    dotenvy::dotenv().ok();
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a scratch database");
    let store = PgStore::connect(&url, 2).unwrap();
    store.apply_schema().unwrap();
    return store;
}

/// Recreates `symbol` with no snapshots or candles.
fn fresh_pair(store: &PgStore, symbol: &str) {
    match store.delete_trading_pair(symbol) {
        Ok(_) | Err(StoreError::UnknownSymbol { .. }) => {}
        Err(err) => panic!("{err:?}"),
    }
    let pair = NewTradingPairBuilder::default()
        .symbol(symbol.to_owned())
        .base_asset("XBT".to_owned())
        .quote_asset("TEST".to_owned())
        .build()
        .unwrap();
    assert_eq!(store.upsert_trading_pair(&pair).unwrap(), UpsertOutcome::Inserted);
}

fn candle(symbol: &str, close: i64) -> NewCandle {
    return NewCandleBuilder::default()
        .symbol(symbol.to_owned())
        .interval(Interval::OneHour)
        .open_time(1000)
        .open_price(Decimal::from(100))
        .high_price(Decimal::from(110))
        .low_price(Decimal::from(95))
        .close_price(Decimal::from(close))
        .volume(Decimal::from(10))
        .close_time(4_600_000)
        .build()
        .unwrap();
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn unknown_symbol_is_referential_error() {
    let _guard = DB.lock();
    let store = store();

    let err = store
        .insert_ticker_snapshot(
            &NewTickerSnapshotBuilder::default()
                .symbol("NOSUCHPAIR".to_owned())
                .price(Decimal::ONE)
                .build()
                .unwrap(),
        )
        .expect_err("foreign key violation");
    assert!(matches!(err, StoreError::UnknownSymbol { .. }), "{err:?}");

    let err = store
        .upsert_candle(&candle("NOSUCHPAIR", 105), ConflictPolicy::Skip)
        .expect_err("foreign key violation");
    assert!(matches!(err, StoreError::UnknownSymbol { .. }), "{err:?}");
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn pair_upsert_keeps_existing_row() {
    let _guard = DB.lock();
    let store = store();
    fresh_pair(&store, "XBPAIR");

    let inactive = NewTradingPairBuilder::default()
        .symbol("XBPAIR".to_owned())
        .base_asset("XBT".to_owned())
        .quote_asset("TEST".to_owned())
        .status(PairStatus::Inactive)
        .build()
        .unwrap();
    assert_eq!(store.upsert_trading_pair(&inactive).unwrap(), UpsertOutcome::Skipped);
    let pair = store.get_trading_pair("XBPAIR").unwrap().unwrap();
    assert_eq!(*pair.status(), PairStatus::Active);

    let updated = store.update_trading_pair(&inactive).unwrap();
    assert_eq!(*updated.status(), PairStatus::Inactive);
    assert_eq!(updated.id(), pair.id());
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn latest_price_scenario() {
    let _guard = DB.lock();
    let store = store();
    fresh_pair(&store, "XBTEST");

    let t2 = Utc::now();
    let t1 = t2 - TimeDelta::seconds(10);
    for (price, at) in [(100, t1), (105, t2)] {
        store
            .insert_ticker_snapshot(
                &NewTickerSnapshotBuilder::default()
                    .symbol("XBTEST".to_owned())
                    .price(Decimal::from(price))
                    .timestamp(at)
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }

    let rows: Vec<_> = store
        .latest_prices()
        .unwrap()
        .into_iter()
        .filter(|row| row.symbol() == "XBTEST")
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(*rows[0].price(), Decimal::from(105));
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn candle_policies() {
    let _guard = DB.lock();
    let store = store();
    fresh_pair(&store, "XBCANDLE");
    let key = CandleKey::new("XBCANDLE", Interval::OneHour, 1000);

    assert_eq!(
        store.upsert_candle(&candle("XBCANDLE", 105), ConflictPolicy::Skip).unwrap(),
        UpsertOutcome::Inserted
    );
    assert_eq!(
        store.upsert_candle(&candle("XBCANDLE", 107), ConflictPolicy::Skip).unwrap(),
        UpsertOutcome::Skipped
    );
    assert_eq!(*store.get_candle(&key).unwrap().unwrap().close_price(), Decimal::from(105));

    let err = store
        .upsert_candle(&candle("XBCANDLE", 107), ConflictPolicy::Reject)
        .expect_err("duplicate key");
    assert!(matches!(err, StoreError::UniquenessConflict { .. }), "{err:?}");

    assert_eq!(
        store.upsert_candle(&candle("XBCANDLE", 108), ConflictPolicy::Overwrite).unwrap(),
        UpsertOutcome::Overwritten
    );
    assert_eq!(*store.get_candle(&key).unwrap().unwrap().close_price(), Decimal::from(108));
    assert_eq!(
        store.candles("XBCANDLE", Interval::OneHour, 0, i64::MAX).unwrap().len(),
        1
    );

    let latest: Vec<_> = store
        .latest_candles()
        .unwrap()
        .into_iter()
        .filter(|row| row.symbol() == "XBCANDLE")
        .collect();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].open_time().timestamp_millis(), 1000);

    let report = store.delete_trading_pair("XBCANDLE").unwrap();
    assert_eq!(*report.candles(), 1);
    assert!(store.get_candle(&key).unwrap().is_none());
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn fetch_job_upsert() {
    let _guard = DB.lock();
    let store = store();

    let ran_at = Utc::now();
    let job = NewFetchJobScheduleBuilder::default()
        .job_name("pg-store-test".to_owned())
        .interval_seconds(60)
        .last_run(Some(ran_at))
        .status(JobStatus::Completed)
        .build()
        .unwrap();
    let first = store.upsert_fetch_job(&job).unwrap();
    let again = store
        .upsert_fetch_job(
            &NewFetchJobScheduleBuilder::default()
                .job_name("pg-store-test".to_owned())
                .interval_seconds(60)
                .status(JobStatus::Running)
                .build()
                .unwrap(),
        )
        .unwrap();
    assert_eq!(again.id(), first.id());
    assert_eq!(*again.status(), JobStatus::Running);
    assert!(again.last_run().is_some());
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn cleanup_scenarios() {
    let _guard = DB.lock();
    let store = store();
    fresh_pair(&store, "XBCLEAN");

    store
        .insert_ticker_snapshot(
            &NewTickerSnapshotBuilder::default()
                .symbol("XBCLEAN".to_owned())
                .price(Decimal::ONE)
                .timestamp(Utc::now() - TimeDelta::seconds(5))
                .build()
                .unwrap(),
        )
        .unwrap();
    store
        .upsert_candle(&candle("XBCLEAN", 105), ConflictPolicy::Skip)
        .unwrap();
    store
        .try_log_api_call(
            &NewApiCallRecordBuilder::default()
                .endpoint("/api/v3/ping".to_owned())
                .response_time_ms(3)
                .success(true)
                .build()
                .unwrap(),
        )
        .unwrap();

    let before = store.table_counts().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(20));
    let report = cleanup_old_data(&store, 0).unwrap();
    assert_eq!(
        report.rows_deleted(RetentionTable::TickerSnapshots),
        Some(*before.ticker_snapshots() as usize)
    );
    assert_eq!(
        report.rows_deleted(RetentionTable::Candles),
        Some(*before.candles() as usize)
    );
    assert_eq!(
        report.rows_deleted(RetentionTable::ApiCallRecords),
        Some(*before.api_call_records() as usize)
    );

    let again = cleanup_before(&store, Utc::now() - TimeDelta::days(30)).unwrap();
    assert_eq!(again.total(), 0);
    assert!(store.get_trading_pair("XBCLEAN").unwrap().is_some());
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn latest_candles_sort_intervals_bytewise() {
    let _guard = DB.lock();
    let store = store();
    fresh_pair(&store, "XBORDER");

    for interval in [Interval::OneHour, Interval::OneMonth, Interval::OneDay] {
        let bar = NewCandleBuilder::default()
            .symbol("XBORDER".to_owned())
            .interval(interval)
            .open_time(0)
            .open_price(Decimal::ONE)
            .high_price(Decimal::ONE)
            .low_price(Decimal::ONE)
            .close_price(Decimal::ONE)
            .volume(Decimal::ONE)
            .close_time(interval.close_time(0).unwrap())
            .build()
            .unwrap();
        store.upsert_candle(&bar, ConflictPolicy::Skip).unwrap();
    }

    let intervals: Vec<Interval> = store
        .latest_candles()
        .unwrap()
        .into_iter()
        .filter(|row| row.symbol() == "XBORDER")
        .map(|row| *row.interval())
        .collect();
    assert_eq!(intervals, [Interval::OneMonth, Interval::OneDay, Interval::OneHour]);
    store.delete_trading_pair("XBORDER").unwrap();
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn api_call_needs_an_endpoint() {
    let _guard = DB.lock();
    let store = store();

    let err = store
        .try_log_api_call(
            &NewApiCallRecordBuilder::default()
                .endpoint(String::new())
                .response_time_ms(3)
                .success(true)
                .build()
                .unwrap(),
        )
        .expect_err("empty endpoint");
    assert!(matches!(err, StoreError::Invalid { .. }), "{err:?}");
}

use chrono::{DateTime, Utc};
use diesel::{
    connection::SimpleConnection,
    dsl::{count_star, max},
    prelude::*,
    r2d2::{ConnectionManager, PooledConnection},
    result::{DatabaseErrorKind, Error as DieselError},
    PgConnection,
};
use garde::Validate;
use models::{
    schema::{api_call_records, candles, fetch_job_schedules, ticker_snapshots, trading_pairs},
    view_schema::{api_stats, latest_candles, latest_prices},
    ApiCallRecord, ApiStat, Candle, CandleKey, FetchJobSchedule, LatestCandle, LatestPrice,
    NewApiCallRecord, NewCandle, NewFetchJobSchedule, NewTickerSnapshot, NewTradingPair,
    TickerSnapshot, TradingPair,
};
use tracing::{debug, info};
use types::{Interval, PairStatus};

use crate::{
    CascadeReport, ConflictPolicy, RetentionTable, Store, StoreError, SymbolActivity, TableCounts,
    UpsertOutcome,
};

pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;
type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

const SCHEMA: &str = include_str!("../../migrations/2024-06-01-000000_create_market_data/up.sql");

/// `Store` backed by PostgreSQL. Cascades, uniqueness and the views are
/// enforced by the schema in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        return Self { pool };
    }

    pub fn connect(database_url: &str, max_size: u32) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = r2d2::Pool::builder()
            .max_size(max_size)
            .build(manager)
            .map_err(|err| StoreError::Transient {
                operation: "connect",
                key: format!("max_size={max_size}"),
                source: Box::new(err),
            })?;
        return Ok(Self::new(pool));
    }

    pub fn pool(&self) -> &PgPool {
        return &self.pool;
    }

    /// Creates tables, indexes and views if they are missing. Same DDL as the
    /// diesel migration, for databases managed without the diesel CLI.
    pub fn apply_schema(&self) -> Result<(), StoreError> {
        const OPERATION: &str = "apply_schema";
        let conn = &mut self.conn(OPERATION, "schema")?;
        conn.batch_execute(SCHEMA)
            .map_err(|err| StoreError::from_diesel(OPERATION, "schema", err))?;
        info!("Schema applied");
        return Ok(());
    }

    fn conn(&self, operation: &'static str, key: &str) -> Result<PgPooledConnection, StoreError> {
        return self.pool.get().map_err(|err| StoreError::Transient {
            operation,
            key: key.to_owned(),
            source: Box::new(err),
        });
    }
}

fn candle_error(operation: &'static str, key: &CandleKey, err: DieselError) -> StoreError {
    return match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::UniquenessConflict {
                operation,
                key: key.clone(),
            }
        }
        err => StoreError::from_diesel_for_symbol(operation, key.symbol(), err),
    };
}

impl Store for PgStore {
    fn upsert_trading_pair(&self, pair: &NewTradingPair) -> Result<UpsertOutcome, StoreError> {
        const OPERATION: &str = "upsert_trading_pair";
        pair.validate(&())
            .map_err(|report| StoreError::invalid(OPERATION, pair.symbol(), report))?;

        let conn = &mut self.conn(OPERATION, pair.symbol())?;
        let inserted = diesel::insert_into(trading_pairs::table)
            .values(pair)
            .on_conflict(trading_pairs::symbol)
            .do_nothing()
            .execute(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, pair.symbol(), err))?;
        return match inserted {
            0 => Ok(UpsertOutcome::Skipped),
            _ => Ok(UpsertOutcome::Inserted),
        };
    }

    fn update_trading_pair(&self, pair: &NewTradingPair) -> Result<TradingPair, StoreError> {
        const OPERATION: &str = "update_trading_pair";
        pair.validate(&())
            .map_err(|report| StoreError::invalid(OPERATION, pair.symbol(), report))?;

        let conn = &mut self.conn(OPERATION, pair.symbol())?;
        let updated = diesel::update(
            trading_pairs::table.filter(trading_pairs::symbol.eq(pair.symbol())),
        )
        .set((
            trading_pairs::status.eq(pair.status()),
            trading_pairs::is_spot_trading_allowed.eq(*pair.is_spot_trading_allowed()),
            trading_pairs::is_margin_trading_allowed.eq(*pair.is_margin_trading_allowed()),
            trading_pairs::updated_at.eq(Utc::now()),
        ))
        .returning(TradingPair::as_returning())
        .get_result(conn)
        .optional()
        .map_err(|err| StoreError::from_diesel(OPERATION, pair.symbol(), err))?;
        return updated.ok_or_else(|| StoreError::UnknownSymbol {
            operation: OPERATION,
            symbol: pair.symbol().to_owned(),
        });
    }

    fn delete_trading_pair(&self, symbol: &str) -> Result<CascadeReport, StoreError> {
        const OPERATION: &str = "delete_trading_pair";
        let conn = &mut self.conn(OPERATION, symbol)?;
        let (snapshots, candle_rows, pairs) = conn
            .transaction::<_, DieselError, _>(|conn| {
                let snapshots = ticker_snapshots::table
                    .filter(ticker_snapshots::symbol.eq(symbol))
                    .count()
                    .get_result::<i64>(conn)?;
                let candle_rows = candles::table
                    .filter(candles::symbol.eq(symbol))
                    .count()
                    .get_result::<i64>(conn)?;
                let pairs = diesel::delete(trading_pairs::table.filter(trading_pairs::symbol.eq(symbol)))
                    .execute(conn)?;
                return Ok((snapshots, candle_rows, pairs));
            })
            .map_err(|err| StoreError::from_diesel(OPERATION, symbol, err))?;

        if pairs == 0 {
            return Err(StoreError::UnknownSymbol {
                operation: OPERATION,
                symbol: symbol.to_owned(),
            });
        }
        info!("Deleted {symbol} with {snapshots} snapshots and {candle_rows} candles");
        return Ok(CascadeReport {
            ticker_snapshots: usize::try_from(snapshots).unwrap_or_default(),
            candles: usize::try_from(candle_rows).unwrap_or_default(),
        });
    }

    fn get_trading_pair(&self, symbol: &str) -> Result<Option<TradingPair>, StoreError> {
        const OPERATION: &str = "get_trading_pair";
        let conn = &mut self.conn(OPERATION, symbol)?;
        return trading_pairs::table
            .filter(trading_pairs::symbol.eq(symbol))
            .select(TradingPair::as_select())
            .first(conn)
            .optional()
            .map_err(|err| StoreError::from_diesel(OPERATION, symbol, err));
    }

    fn list_trading_pairs(&self, active_only: bool) -> Result<Vec<TradingPair>, StoreError> {
        const OPERATION: &str = "list_trading_pairs";
        let key = format!("active_only={active_only}");
        let conn = &mut self.conn(OPERATION, &key)?;
        let mut query = trading_pairs::table
            .select(TradingPair::as_select())
            .order(trading_pairs::symbol)
            .into_boxed();
        if active_only {
            query = query.filter(trading_pairs::status.eq(PairStatus::Active));
        }
        return query
            .load(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, &key, err));
    }

    fn insert_ticker_snapshot(
        &self,
        snapshot: &NewTickerSnapshot,
    ) -> Result<TickerSnapshot, StoreError> {
        const OPERATION: &str = "insert_ticker_snapshot";
        snapshot
            .validate(&())
            .map_err(|report| StoreError::invalid(OPERATION, snapshot.symbol(), report))?;

        let conn = &mut self.conn(OPERATION, snapshot.symbol())?;
        return diesel::insert_into(ticker_snapshots::table)
            .values(snapshot)
            .returning(TickerSnapshot::as_returning())
            .get_result(conn)
            .map_err(|err| StoreError::from_diesel_for_symbol(OPERATION, snapshot.symbol(), err));
    }

    fn symbol_history(&self, symbol: &str, limit: i64) -> Result<Vec<TickerSnapshot>, StoreError> {
        const OPERATION: &str = "symbol_history";
        if limit < 0 {
            return Err(StoreError::invalid(
                OPERATION,
                symbol,
                format!("limit {limit} must not be negative"),
            ));
        }
        let conn = &mut self.conn(OPERATION, symbol)?;
        return ticker_snapshots::table
            .filter(ticker_snapshots::symbol.eq(symbol))
            .order((ticker_snapshots::timestamp.desc(), ticker_snapshots::id.desc()))
            .limit(limit)
            .select(TickerSnapshot::as_select())
            .load(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, symbol, err));
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

        let conn = &mut self.conn(OPERATION, &key.to_string())?;
        let insert = diesel::insert_into(candles::table).values(candle);
        let outcome = match policy {
            ConflictPolicy::Reject => insert.execute(conn).map(|_| UpsertOutcome::Inserted),
            ConflictPolicy::Skip => insert
                .on_conflict((candles::symbol, candles::interval, candles::open_time))
                .do_nothing()
                .execute(conn)
                .map(|inserted| match inserted {
                    0 => UpsertOutcome::Skipped,
                    _ => UpsertOutcome::Inserted,
                }),
            ConflictPolicy::Overwrite => conn.transaction::<_, DieselError, _>(|conn| {
                let inserted = insert
                    .on_conflict((candles::symbol, candles::interval, candles::open_time))
                    .do_nothing()
                    .execute(conn)?;
                if inserted > 0 {
                    return Ok(UpsertOutcome::Inserted);
                }
                diesel::update(
                    candles::table.filter(
                        candles::symbol
                            .eq(candle.symbol())
                            .and(candles::interval.eq(candle.interval()))
                            .and(candles::open_time.eq(candle.open_time())),
                    ),
                )
                .set(candle)
                .execute(conn)?;
                return Ok(UpsertOutcome::Overwritten);
            }),
        };
        let outcome = outcome.map_err(|err| candle_error(OPERATION, &key, err))?;
        debug!("Candle {key}: {outcome:?}");
        return Ok(outcome);
    }

    fn get_candle(&self, key: &CandleKey) -> Result<Option<Candle>, StoreError> {
        const OPERATION: &str = "get_candle";
        let conn = &mut self.conn(OPERATION, &key.to_string())?;
        return candles::table
            .filter(
                candles::symbol
                    .eq(key.symbol())
                    .and(candles::interval.eq(key.interval()))
                    .and(candles::open_time.eq(key.open_time())),
            )
            .select(Candle::as_select())
            .first(conn)
            .optional()
            .map_err(|err| StoreError::from_diesel(OPERATION, &key.to_string(), err));
    }

    fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        start: i64,
        end: i64,
    ) -> Result<Vec<Candle>, StoreError> {
        const OPERATION: &str = "candles";
        let key = format!("{symbol}/{interval}@{start}..={end}");
        let conn = &mut self.conn(OPERATION, &key)?;
        return candles::table
            .filter(
                candles::symbol
                    .eq(symbol)
                    .and(candles::interval.eq(interval))
                    .and(candles::open_time.between(start, end)),
            )
            .order(candles::open_time.asc())
            .select(Candle::as_select())
            .load(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, &key, err));
    }

    fn try_log_api_call(&self, record: &NewApiCallRecord) -> Result<ApiCallRecord, StoreError> {
        const OPERATION: &str = "log_api_call";
        if record.endpoint().is_empty() {
            return Err(StoreError::invalid(OPERATION, "", "endpoint is empty"));
        }
        let conn = &mut self.conn(OPERATION, record.endpoint())?;
        return diesel::insert_into(api_call_records::table)
            .values(record)
            .returning(ApiCallRecord::as_returning())
            .get_result(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, record.endpoint(), err));
    }

    fn upsert_fetch_job(&self, job: &NewFetchJobSchedule) -> Result<FetchJobSchedule, StoreError> {
        const OPERATION: &str = "upsert_fetch_job";
        if job.job_name().is_empty() {
            return Err(StoreError::invalid(OPERATION, "", "job name is empty"));
        }
        let conn = &mut self.conn(OPERATION, job.job_name())?;
        // None run times are left out of the changeset and keep the stored value
        return diesel::insert_into(fetch_job_schedules::table)
            .values(job)
            .on_conflict(fetch_job_schedules::job_name)
            .do_update()
            .set((job, fetch_job_schedules::updated_at.eq(Utc::now())))
            .returning(FetchJobSchedule::as_returning())
            .get_result(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, job.job_name(), err));
    }

    fn get_fetch_job(&self, job_name: &str) -> Result<Option<FetchJobSchedule>, StoreError> {
        const OPERATION: &str = "get_fetch_job";
        let conn = &mut self.conn(OPERATION, job_name)?;
        return fetch_job_schedules::table
            .filter(fetch_job_schedules::job_name.eq(job_name))
            .select(FetchJobSchedule::as_select())
            .first(conn)
            .optional()
            .map_err(|err| StoreError::from_diesel(OPERATION, job_name, err));
    }

    fn list_fetch_jobs(&self) -> Result<Vec<FetchJobSchedule>, StoreError> {
        const OPERATION: &str = "list_fetch_jobs";
        let conn = &mut self.conn(OPERATION, "*")?;
        return fetch_job_schedules::table
            .order(fetch_job_schedules::job_name)
            .select(FetchJobSchedule::as_select())
            .load(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, "*", err));
    }

    fn latest_prices(&self) -> Result<Vec<LatestPrice>, StoreError> {
        const OPERATION: &str = "latest_prices";
        let conn = &mut self.conn(OPERATION, "*")?;
        return latest_prices::table
            .order(latest_prices::symbol)
            .select(LatestPrice::as_select())
            .load(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, "*", err));
    }

    fn latest_candles(&self) -> Result<Vec<LatestCandle>, StoreError> {
        const OPERATION: &str = "latest_candles";
        let conn = &mut self.conn(OPERATION, "*")?;
        return latest_candles::table
            .order((latest_candles::symbol, latest_candles::interval))
            .select(LatestCandle::as_select())
            .load(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, "*", err));
    }

    fn api_stats(&self) -> Result<Vec<ApiStat>, StoreError> {
        const OPERATION: &str = "api_stats";
        let conn = &mut self.conn(OPERATION, "*")?;
        return api_stats::table
            .order((api_stats::total_calls.desc(), api_stats::endpoint))
            .select(ApiStat::as_select())
            .load(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, "*", err));
    }

    fn table_counts(&self) -> Result<TableCounts, StoreError> {
        const OPERATION: &str = "table_counts";
        let conn = &mut self.conn(OPERATION, "*")?;
        let counts = (|| -> Result<TableCounts, DieselError> {
            return Ok(TableCounts {
                trading_pairs: trading_pairs::table.count().get_result(conn)?,
                ticker_snapshots: ticker_snapshots::table.count().get_result(conn)?,
                candles: candles::table.count().get_result(conn)?,
                api_call_records: api_call_records::table.count().get_result(conn)?,
                fetch_job_schedules: fetch_job_schedules::table.count().get_result(conn)?,
            });
        })();
        return counts.map_err(|err| StoreError::from_diesel(OPERATION, "*", err));
    }

    fn symbol_activity(&self) -> Result<Vec<SymbolActivity>, StoreError> {
        const OPERATION: &str = "symbol_activity";
        let conn = &mut self.conn(OPERATION, "*")?;
        let rows: Vec<(String, i64, Option<DateTime<Utc>>)> = ticker_snapshots::table
            .group_by(ticker_snapshots::symbol)
            .select((
                ticker_snapshots::symbol,
                count_star(),
                max(ticker_snapshots::timestamp),
            ))
            .order((count_star().desc(), ticker_snapshots::symbol))
            .load(conn)
            .map_err(|err| StoreError::from_diesel(OPERATION, "*", err))?;
        return Ok(rows
            .into_iter()
            .map(|(symbol, records, last_update)| SymbolActivity {
                symbol,
                records,
                last_update,
            })
            .collect());
    }

    fn delete_older_than(
        &self,
        table: RetentionTable,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        const OPERATION: &str = "delete_older_than";
        let conn = &mut self.conn(OPERATION, table.table_name())?;
        let deleted = match table {
            RetentionTable::TickerSnapshots => diesel::delete(
                ticker_snapshots::table.filter(ticker_snapshots::timestamp.lt(cutoff)),
            )
            .execute(conn),
            RetentionTable::Candles => {
                diesel::delete(candles::table.filter(candles::created_at.lt(cutoff))).execute(conn)
            }
            RetentionTable::ApiCallRecords => diesel::delete(
                api_call_records::table.filter(api_call_records::created_at.lt(cutoff)),
            )
            .execute(conn),
        };
        return deleted.map_err(|err| StoreError::from_diesel(OPERATION, table.table_name(), err));
    }
}

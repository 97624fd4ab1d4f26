use anyhow::Context;
use binance_api::rest::{
    client::Client,
    market::klines::{Kline, KlinesBuilder, MAX_KLINES_LIMIT},
    query::Query,
};
use chrono::{DateTime, TimeDelta, Utc};
use store::{ConflictPolicy, Store, UpsertOutcome};
use tracing::{debug, info};
use types::Interval;

use crate::convert::candle_from_kline;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Backfill {
    pub fetched: usize,
    pub inserted: usize,
    pub overwritten: usize,
    pub skipped: usize,
}

/// `[end - days, end]` in epoch ms.
pub fn lookback(end: DateTime<Utc>, days: u32) -> anyhow::Result<(i64, i64)> {
    let start = TimeDelta::try_days(i64::from(days))
        .and_then(|window| end.checked_sub_signed(window))
        .context(format!("Looking back {days} days from {end}"))?;
    return Ok((start.timestamp_millis(), end.timestamp_millis()));
}

/// Where the next page starts: just after the last bar of `page`. `None` when
/// the page was not full, the range is exhausted or the cursor would not move.
pub fn next_cursor(page: &[Kline], cursor: i64, end: i64) -> Option<i64> {
    if page.len() < usize::from(MAX_KLINES_LIMIT) {
        return None;
    }
    let next = page.last()?.open_time().checked_add(1)?;
    if next <= cursor || next > end {
        return None;
    }
    return Some(next);
}

/// Fetches every `interval` bar of `symbol` opening in `[start, end]` (epoch
/// ms), a thousand per request, and stores them under `policy`.
pub async fn backfill<C>(
    client: &C,
    store: &dyn Store,
    symbol: &str,
    interval: Interval,
    (start, end): (i64, i64),
    policy: ConflictPolicy,
) -> anyhow::Result<Backfill>
where
    C: Client + Sync,
{
    let mut backfill = Backfill::default();
    let mut cursor = start;
    loop {
        let page: Vec<Kline> = KlinesBuilder::default()
            .symbol(symbol)
            .interval(interval)
            .start_time(cursor)
            .end_time(end)
            .limit(MAX_KLINES_LIMIT)
            .build()?
            .query(client)
            .await
            .context(format!("Fetching {symbol} {interval} klines from {cursor}"))?;
        debug!("{symbol} {interval}: {} klines from {cursor}", page.len());
        backfill.fetched += page.len();

        for kline in &page {
            let candle = candle_from_kline(symbol, interval, kline)?;
            let outcome = store
                .upsert_candle(&candle, policy)
                .context(format!("Storing {}", candle.key()))?;
            match outcome {
                UpsertOutcome::Inserted => backfill.inserted += 1,
                UpsertOutcome::Overwritten => backfill.overwritten += 1,
                UpsertOutcome::Skipped => backfill.skipped += 1,
            }
        }

        match next_cursor(&page, cursor, end) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    info!(
        "{symbol} {interval}: {} klines, {} new, {} overwritten, {} already stored",
        backfill.fetched, backfill.inserted, backfill.overwritten, backfill.skipped
    );
    return Ok(backfill);
}

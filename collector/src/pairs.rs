use std::borrow::Cow;

use anyhow::Context;
use binance_api::rest::{
    client::Client,
    market::exchange_info::{ExchangeInfoBuilder, ExchangeInfoResponse},
    query::Query,
};
use models::NewTradingPair;
use store::{Store, UpsertOutcome};
use tracing::{info, warn};

use crate::convert::pair_from_symbol_info;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PairSync {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Inserts unknown pairs and refreshes status and capability flags of known
/// ones. An empty `symbols` syncs every pair the exchange lists.
pub async fn sync_pairs<C>(client: &C, store: &dyn Store, symbols: &[String]) -> anyhow::Result<PairSync>
where
    C: Client + Sync,
{
    let info: ExchangeInfoResponse = ExchangeInfoBuilder::default()
        .symbols(symbols.iter().map(|s| Cow::Borrowed(s.as_str())).collect())
        .build()?
        .query(client)
        .await
        .context("Fetching exchange info")?;

    let mut sync = PairSync::default();
    for symbol in info.symbols() {
        let result = pair_from_symbol_info(symbol).and_then(|pair| sync_pair(store, &pair));
        match result {
            Ok(UpsertOutcome::Inserted) => sync.inserted += 1,
            Ok(UpsertOutcome::Overwritten) => sync.updated += 1,
            Ok(UpsertOutcome::Skipped) => sync.unchanged += 1,
            Err(err) => {
                warn!("Syncing pair {}: {err:#}", symbol.symbol());
                sync.failed += 1;
            }
        }
    }
    info!(
        "Pairs synced: {} inserted, {} updated, {} unchanged, {} failed",
        sync.inserted, sync.updated, sync.unchanged, sync.failed
    );
    return Ok(sync);
}

fn sync_pair(store: &dyn Store, pair: &NewTradingPair) -> anyhow::Result<UpsertOutcome> {
    if store.upsert_trading_pair(pair)? == UpsertOutcome::Inserted {
        return Ok(UpsertOutcome::Inserted);
    }
    let stored = store
        .get_trading_pair(pair.symbol())?
        .context(format!("{} vanished after upsert", pair.symbol()))?;
    let changed = stored.status() != pair.status()
        || stored.is_spot_trading_allowed() != pair.is_spot_trading_allowed()
        || stored.is_margin_trading_allowed() != pair.is_margin_trading_allowed();
    if !changed {
        return Ok(UpsertOutcome::Skipped);
    }
    store.update_trading_pair(pair)?;
    return Ok(UpsertOutcome::Overwritten);
}

/// Syncs whichever of `symbols` the store does not know yet. Failures only
/// warn: snapshots and candles of a still unknown symbol fail on their own.
pub async fn ensure_pairs<C>(client: &C, store: &dyn Store, symbols: &[String])
where
    C: Client + Sync,
{
    let mut missing = Vec::new();
    for symbol in symbols {
        match store.get_trading_pair(symbol) {
            Ok(Some(_)) => {}
            Ok(None) => missing.push(symbol.clone()),
            Err(err) => warn!("Looking up pair {symbol}: {:#}", anyhow::Error::from(err)),
        }
    }
    if missing.is_empty() {
        return;
    }
    if let Err(err) = sync_pairs(client, store, &missing).await {
        warn!("Registering pairs {}: {err:#}", missing.join(","));
    }
}

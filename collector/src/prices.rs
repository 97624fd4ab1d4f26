use anyhow::Context;
use binance_api::rest::{
    client::Client,
    market::ticker::{Ticker24h, Ticker24hrBuilder},
    query::Query,
};
use chrono::Utc;
use store::Store;
use tracing::{error, info};

use crate::{
    convert::{snapshot_from_ticker, top_usdt_by_quote_volume, TOP_PAIRS},
    pairs::ensure_pairs,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub stored: usize,
    pub failed: usize,
}

/// Stores one 24h ticker snapshot per symbol. A failing symbol is logged and
/// counted, the others are still fetched.
pub async fn fetch_prices<C>(client: &C, store: &dyn Store, symbols: &[String]) -> FetchSummary
where
    C: Client + Sync,
{
    info!("Tracking {} symbols: {}", symbols.len(), symbols.join(", "));
    ensure_pairs(client, store, symbols).await;

    let mut summary = FetchSummary::default();
    for symbol in symbols {
        match fetch_price(client, store, symbol).await {
            Ok(()) => summary.stored += 1,
            Err(err) => {
                error!("Fetching {symbol}: {err:#}");
                summary.failed += 1;
            }
        }
    }
    info!("Stored {} snapshots, {} failed", summary.stored, summary.failed);
    return summary;
}

async fn fetch_price<C>(client: &C, store: &dyn Store, symbol: &str) -> anyhow::Result<()>
where
    C: Client + Sync,
{
    let ticker: Ticker24h = Ticker24hrBuilder::default()
        .symbol(symbol)
        .build()?
        .query(client)
        .await
        .context("Fetching 24h ticker")?;
    let snapshot = store.insert_ticker_snapshot(&snapshot_from_ticker(&ticker, Utc::now())?)?;
    info!(
        "{} {} {}% vol {}",
        snapshot.symbol(),
        snapshot.price(),
        snapshot.price_change_percent(),
        snapshot.volume()
    );
    return Ok(());
}

/// Symbols of the busiest USDT pairs, read from the all-symbols ticker.
pub async fn top_symbols<C>(client: &C) -> anyhow::Result<Vec<String>>
where
    C: Client + Sync,
{
    let tickers: Vec<Ticker24h> = Ticker24hrBuilder::default()
        .build()?
        .query(client)
        .await
        .context("Fetching all 24h tickers")?;
    let symbols = top_usdt_by_quote_volume(&tickers, TOP_PAIRS);
    info!("Picked {} of {} symbols by quote volume", symbols.len(), tickers.len());
    return Ok(symbols);
}

mod api_log;
mod cli;
mod config;
mod convert;
mod history;
mod jobs;
mod pairs;
mod prices;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Context;
use binance_api::{
    rest::{
        client::Client,
        market::ping::{Ping, Pong, ServerTime, ServerTimeResponse},
        query::Query,
    },
    RestClient,
};
use chrono::Utc;
use clap::Parser;
use store::{cleanup_old_data, PgStore, Store};
use tracing::{error, info};
use types::Interval;

use crate::{
    api_log::StoreObserver,
    cli::{Cli, Commands},
    config::{parse_symbols, Config},
    jobs::{JobRun, HISTORY_INTERVAL_SECONDS, HISTORY_JOB, PRICES_INTERVAL_SECONDS, PRICES_JOB},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variables may come from the environment alone
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pg = PgStore::connect(&config.database_url, config.pool_size)
        .context("Connecting to database")?;
    if let Commands::Migrate = cli.command {
        pg.apply_schema().context("Applying schema")?;
        return Ok(());
    }
    let store: Arc<dyn Store> = Arc::new(pg);

    let mut client = RestClient::new(&config.binance_base_url)?
        .with_weight_limit(config.weight_limit)
        .with_observer(Arc::new(StoreObserver::new(store.clone())));
    if let Some(api_key) = &config.binance_api_key {
        client = client.with_api_key(api_key);
    }

    match cli.command {
        Commands::Migrate => {}
        Commands::Ping => {
            let _: Pong = Ping.query(&client).await.context("Pinging Binance")?;
            let time: ServerTimeResponse = ServerTime.query(&client).await.context("Reading server time")?;
            let server = time.as_datetime().context("Server time out of range")?;
            info!(
                "Binance reachable, server time {server}, local clock off by {}ms",
                (Utc::now() - server).num_milliseconds()
            );
        }
        Commands::Pairs { symbols } => {
            let symbols = symbols
                .map(|list| parse_symbols(&list))
                .unwrap_or(config.trading_pairs);
            pairs::sync_pairs(&client, store.as_ref(), &symbols).await?;
        }
        Commands::Prices { symbols, all } => {
            let run = JobRun::start(store.as_ref(), PRICES_JOB, PRICES_INTERVAL_SECONDS)?;
            let symbols = match (all, symbols) {
                (true, _) => match prices::top_symbols(&client).await {
                    Ok(symbols) => symbols,
                    Err(err) => {
                        run.finish(false)?;
                        return Err(err);
                    }
                },
                (false, Some(list)) => parse_symbols(&list),
                (false, None) => config.trading_pairs,
            };
            let summary = prices::fetch_prices(&client, store.as_ref(), &symbols).await;
            run.finish(summary.failed == 0)?;
            print_latest_prices(store.as_ref())?;
        }
        Commands::History {
            symbol,
            symbols,
            interval,
            days,
            on_conflict,
        } => {
            let symbols = symbols
                .map(|list| parse_symbols(&list))
                .unwrap_or_else(|| vec![symbol.to_uppercase()]);
            let run = JobRun::start(store.as_ref(), HISTORY_JOB, HISTORY_INTERVAL_SECONDS)?;
            match fetch_history(&client, store.as_ref(), &symbols, interval, days, on_conflict.into()).await {
                Ok(failed) => {
                    run.finish(failed == 0)?;
                }
                Err(err) => {
                    run.finish(false)?;
                    return Err(err);
                }
            }
        }
        Commands::Cleanup { days } => {
            let report = cleanup_old_data(store.as_ref(), days)?;
            for entry in report.entries() {
                info!("{}: {} rows deleted", entry.table(), entry.rows_deleted());
            }
        }
    }
    return Ok(());
}

/// Returns how many symbols failed.
async fn fetch_history<C>(
    client: &C,
    store: &dyn Store,
    symbols: &[String],
    interval: Interval,
    days: u32,
    policy: store::ConflictPolicy,
) -> anyhow::Result<usize>
where
    C: Client + Sync,
{
    let range = history::lookback(Utc::now(), days)?;
    pairs::ensure_pairs(client, store, symbols).await;

    let mut failed = 0;
    for (i, symbol) in symbols.iter().enumerate() {
        info!("[{}/{}] {symbol} {interval}, last {days} days", i + 1, symbols.len());
        if let Err(err) = history::backfill(client, store, symbol, interval, range, policy).await {
            error!("Backfilling {symbol}: {err:#}");
            failed += 1;
        }
    }
    return Ok(failed);
}

fn print_latest_prices(store: &dyn Store) -> anyhow::Result<()> {
    for price in store.latest_prices()? {
        info!(
            "{:10} {:>14} {:>8}% @{}",
            price.symbol(),
            price.price(),
            price.price_change_percent(),
            price.timestamp()
        );
    }
    return Ok(());
}

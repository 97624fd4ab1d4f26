use binance_api::rest::market::{exchange_info::SymbolInfo, klines::Kline, ticker::Ticker24h};
use chrono::{DateTime, Utc};
use models::{
    candle::NewCandleBuilder, ticker_snapshot::NewTickerSnapshotBuilder,
    trading_pair::NewTradingPairBuilder, NewCandle, NewTickerSnapshot, NewTradingPair,
};
use types::{Interval, PairStatus};

pub const TOP_PAIRS: usize = 20;

pub fn pair_from_symbol_info(info: &SymbolInfo) -> anyhow::Result<NewTradingPair> {
    let pair = NewTradingPairBuilder::default()
        .symbol(info.symbol().to_owned())
        .base_asset(info.base_asset().to_owned())
        .quote_asset(info.quote_asset().to_owned())
        .status(PairStatus::from_exchange(info.status()))
        .is_spot_trading_allowed(*info.is_spot_trading_allowed())
        .is_margin_trading_allowed(*info.is_margin_trading_allowed())
        .build()?;
    return Ok(pair);
}

/// The snapshot price is the ticker's last traded price.
pub fn snapshot_from_ticker(
    ticker: &Ticker24h,
    fetched_at: DateTime<Utc>,
) -> anyhow::Result<NewTickerSnapshot> {
    let snapshot = NewTickerSnapshotBuilder::default()
        .symbol(ticker.symbol().to_owned())
        .price(*ticker.last_price())
        .price_change(*ticker.price_change())
        .price_change_percent(*ticker.price_change_percent())
        .weighted_avg_price(*ticker.weighted_avg_price())
        .high_price(*ticker.high_price())
        .low_price(*ticker.low_price())
        .open_price(*ticker.open_price())
        .last_price(*ticker.last_price())
        .volume(*ticker.volume())
        .quote_volume(*ticker.quote_volume())
        .bid_price(*ticker.bid_price())
        .bid_qty(*ticker.bid_qty())
        .ask_price(*ticker.ask_price())
        .ask_qty(*ticker.ask_qty())
        .num_trades(*ticker.count())
        .open_time(*ticker.open_time())
        .close_time(*ticker.close_time())
        .timestamp(fetched_at)
        .build()?;
    return Ok(snapshot);
}

pub fn candle_from_kline(symbol: &str, interval: Interval, kline: &Kline) -> anyhow::Result<NewCandle> {
    let candle = NewCandleBuilder::default()
        .symbol(symbol.to_owned())
        .interval(interval)
        .open_time(*kline.open_time())
        .open_price(*kline.open())
        .high_price(*kline.high())
        .low_price(*kline.low())
        .close_price(*kline.close())
        .volume(*kline.volume())
        .close_time(*kline.close_time())
        .quote_asset_volume(*kline.quote_asset_volume())
        .num_trades(*kline.num_trades())
        .taker_buy_base_volume(*kline.taker_buy_base_volume())
        .taker_buy_quote_volume(*kline.taker_buy_quote_volume())
        .build()?;
    return Ok(candle);
}

/// Symbols of the `count` USDT-quoted tickers with the highest quote volume.
pub fn top_usdt_by_quote_volume(tickers: &[Ticker24h], count: usize) -> Vec<String> {
    let mut usdt: Vec<&Ticker24h> = tickers
        .iter()
        .filter(|ticker| ticker.symbol().ends_with("USDT"))
        .collect();
    usdt.sort_by(|a, b| b.quote_volume().cmp(a.quote_volume()));
    return usdt
        .into_iter()
        .take(count)
        .map(|ticker| ticker.symbol().to_owned())
        .collect();
}

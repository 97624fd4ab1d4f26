use clap::{Parser, Subcommand, ValueEnum};
use store::ConflictPolicy;
use types::Interval;

pub const MAX_HISTORY_DAYS: i64 = 3650;

#[derive(Parser)]
#[command(name = "collector")]
#[command(about = "Fetches Binance market data into PostgreSQL", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create tables, indexes and views
    Migrate,
    /// Check connectivity and clock drift against Binance
    Ping,
    /// Sync trading pairs from exchange info
    Pairs {
        /// Comma-separated symbols, defaults to TRADING_PAIRS
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Store a 24h ticker snapshot per symbol
    Prices {
        /// Comma-separated symbols, defaults to TRADING_PAIRS
        #[arg(long, conflicts_with = "all")]
        symbols: Option<String>,
        /// Top USDT pairs by quote volume instead of a fixed list
        #[arg(long)]
        all: bool,
    },
    /// Backfill klines
    History {
        #[arg(long, default_value = "BTCUSDT", conflicts_with = "symbols")]
        symbol: String,
        /// Comma-separated symbols
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long, default_value = "1h")]
        interval: Interval,
        /// Days to look back, at most ten years
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=MAX_HISTORY_DAYS))]
        days: u32,
        /// What to do with bars that are already stored
        #[arg(long, value_enum, default_value_t = OnConflict::Skip)]
        on_conflict: OnConflict,
    },
    /// Delete snapshots, candles and API call records older than --days
    Cleanup {
        #[arg(long, default_value_t = store::DEFAULT_DAYS_TO_KEEP)]
        days: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnConflict {
    /// Keep stored bars
    Skip,
    /// Replace stored bars, for refreshing the still-open one
    Overwrite,
}

impl From<OnConflict> for ConflictPolicy {
    fn from(value: OnConflict) -> Self {
        return match value {
            OnConflict::Skip => ConflictPolicy::Skip,
            OnConflict::Overwrite => ConflictPolicy::Overwrite,
        };
    }
}

use anyhow::Context;
use binance_api::{rest::client::DEFAULT_WEIGHT_LIMIT, DEFAULT_BASE_URL};

const DEFAULT_TRADING_PAIRS: &str = "BTCUSDT,ETHUSDT,BNBUSDT,ADAUSDT,DOGEUSDT";
const DEFAULT_POOL_SIZE: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub pool_size: u32,
    pub binance_base_url: String,
    pub binance_api_key: Option<String>,
    pub weight_limit: u32,
    pub trading_pairs: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL from .env file")?;
        let pool_size = optional_var("DATABASE_POOL_SIZE")
            .map(|value| value.parse().context(format!("DATABASE_POOL_SIZE={value}")))
            .transpose()?
            .unwrap_or(DEFAULT_POOL_SIZE);
        let weight_limit = optional_var("BINANCE_WEIGHT_LIMIT")
            .map(|value| value.parse().context(format!("BINANCE_WEIGHT_LIMIT={value}")))
            .transpose()?
            .unwrap_or(DEFAULT_WEIGHT_LIMIT);

        return Ok(Self {
            database_url,
            pool_size,
            binance_base_url: optional_var("BINANCE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            binance_api_key: optional_var("BINANCE_API_KEY"),
            weight_limit,
            trading_pairs: parse_symbols(
                &optional_var("TRADING_PAIRS").unwrap_or_else(|| DEFAULT_TRADING_PAIRS.to_owned()),
            ),
        });
    }
}

/// Unset and empty are the same thing.
fn optional_var(key: &str) -> Option<String> {
    return std::env::var(key).ok().filter(|value| !value.trim().is_empty());
}

/// Splits `"btcusdt, ETHUSDT,,"` into `["BTCUSDT", "ETHUSDT"]`.
pub fn parse_symbols(list: &str) -> Vec<String> {
    return list
        .split(',')
        .map(|symbol| symbol.trim().to_uppercase())
        .filter(|symbol| !symbol.is_empty())
        .collect();
}

#[cfg(test)]
mod tests {
    use super::{parse_symbols, DEFAULT_TRADING_PAIRS};

    #[test]
    fn symbols_are_trimmed_and_uppercased() {
        assert_eq!(parse_symbols(" btcusdt, ETHUSDT,,"), ["BTCUSDT", "ETHUSDT"]);
        assert!(parse_symbols("").is_empty());
        assert_eq!(parse_symbols(DEFAULT_TRADING_PAIRS).len(), 5);
    }
}

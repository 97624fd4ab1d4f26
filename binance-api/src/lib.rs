pub mod error;
pub mod rest;

pub use rest::client::{ApiCall, CallObserver, RestClient};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

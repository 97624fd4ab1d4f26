pub mod avg_price;
pub mod depth;
pub mod exchange_info;
pub mod klines;
pub mod ping;
pub mod ticker;
pub mod trades;

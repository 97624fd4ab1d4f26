pub mod client;
pub mod endpoint;
pub mod market;
pub mod params;
pub mod query;

use std::collections::HashMap;

use async_trait::async_trait;
use binance_api::{error::Error, rest::client::Client};
use bytes::Bytes;
use http::{request, response, StatusCode};
use parking_lot::Mutex;
use url::Url;

/// Serves canned bodies keyed by request path and records every URI asked for.
/// A route may hold several bodies, served in order; the last one repeats.
#[derive(Default)]
pub struct FakeBinance {
    routes: Mutex<HashMap<String, Vec<(StatusCode, String)>>>,
    pub requested: Mutex<Vec<String>>,
}

impl FakeBinance {
    pub fn route(self, path: &str, status: StatusCode, body: impl Into<String>) -> Self {
        self.routes
            .lock()
            .entry(path.to_owned())
            .or_default()
            .push((status, body.into()));
        return self;
    }

    pub fn requested(&self) -> Vec<String> {
        return self.requested.lock().clone();
    }
}

#[async_trait]
impl Client for FakeBinance {
    fn url(&self, endpoint: &str) -> Result<Url, Error> {
        return Ok(Url::parse("https://api.binance.com/")?.join(endpoint)?);
    }

    async fn exec(&self, request: request::Builder) -> Result<response::Response<Bytes>, Error> {
        let request = request.body(())?;
        self.requested.lock().push(request.uri().to_string());
        let mut routes = self.routes.lock();
        let (status, body) = match routes.get_mut(request.uri().path()) {
            Some(bodies) if bodies.len() > 1 => bodies.remove(0),
            Some(bodies) => bodies[0].clone(),
            None => (
                StatusCode::NOT_FOUND,
                r#"{"code":-1,"msg":"no such route"}"#.to_owned(),
            ),
        };
        return Ok(response::Builder::new()
            .status(status)
            .body(Bytes::from(body))?);
    }
}

pub fn symbol_json(symbol: &str, base: &str, quote: &str, status: &str) -> String {
    return format!(
        r#"{{"symbol":"{symbol}","status":"{status}","baseAsset":"{base}","quoteAsset":"{quote}",
        "isSpotTradingAllowed":true,"isMarginTradingAllowed":false}}"#
    );
}

pub fn exchange_info_json(symbols: &[String]) -> String {
    return format!(
        r#"{{"timezone":"UTC","serverTime":1717200000000,"symbols":[{}]}}"#,
        symbols.join(",")
    );
}

/// A 1h kline opening at `open_time` with the given close price.
pub fn kline_json(open_time: i64, close: i64) -> String {
    return format!(
        r#"[{open_time},"100","110","90","{close}","10",{},"1000",5,"4","400","0"]"#,
        open_time + 3_599_999
    );
}

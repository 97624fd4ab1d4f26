use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use bytes::Bytes;
use derive_builder::Builder;
use derive_getters::Getters;
use http::{request, response, HeaderMap, HeaderValue};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;

const API_KEY_HEADER: &str = "x-mbx-apikey";
const USED_WEIGHT_HEADER: &str = "x-mbx-used-weight-1m";
pub const DEFAULT_WEIGHT_LIMIT: u32 = 6000;

#[async_trait]
pub trait Client {
    fn url(&self, endpoint: &str) -> Result<Url, Error>;

    async fn exec(&self, request: request::Builder) -> Result<response::Response<Bytes>, Error>;
}

/// Outcome of one HTTP exchange, as handed to a `CallObserver`.
#[derive(Debug, Clone, Builder, Getters)]
pub struct ApiCall {
    endpoint: String,
    #[builder(default = "\"GET\".to_owned()")]
    method: String,
    /// Query string as a JSON object, `None` without parameters.
    #[builder(default)]
    params: Option<serde_json::Value>,
    /// `None` when no response arrived.
    #[builder(default)]
    status: Option<u16>,
    latency_ms: u64,
    success: bool,
    #[builder(default)]
    error_message: Option<String>,
    #[builder(default)]
    weight_used: Option<u32>,
    #[builder(default)]
    weight_remaining: Option<u32>,
}

/// Sees every request `RestClient` makes, failed ones included.
pub trait CallObserver: Send + Sync {
    fn on_call(&self, call: &ApiCall);
}

pub struct RestClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    weight_limit: u32,
    observer: Option<Arc<dyn CallObserver>>,
}

impl RestClient {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        // join() replaces the last path segment unless the base ends with '/'
        let base_url = match base_url.ends_with('/') {
            true => Url::parse(base_url)?,
            false => Url::parse(&format!("{base_url}/"))?,
        };

        return Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: None,
            weight_limit: DEFAULT_WEIGHT_LIMIT,
            observer: None,
        });
    }

    /// Sent as `X-MBX-APIKEY`. Market data endpoints work without it.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        return self;
    }

    pub fn with_weight_limit(mut self, weight_limit: u32) -> Self {
        self.weight_limit = weight_limit;
        return self;
    }

    pub fn with_observer(mut self, observer: Arc<dyn CallObserver>) -> Self {
        self.observer = Some(observer);
        return self;
    }

    pub fn weight_limit(&self) -> u32 {
        return self.weight_limit;
    }

    async fn send(&self, http_request: http::Request<Vec<u8>>) -> Result<response::Response<Bytes>, Error> {
        let request: reqwest::Request = http_request.try_into()?;
        let resp = self.client.execute(request).await?;
        let mut http_resp = http::response::Response::builder()
            .status(resp.status())
            .version(resp.version());

        if let Some(http_headers) = http_resp.headers_mut() {
            for (key, value) in resp.headers() {
                http_headers.insert(key, value.to_owned());
            }
        }
        return Ok(http_resp.body(resp.bytes().await?)?);
    }

    fn record(
        &self,
        endpoint: String,
        method: String,
        params: Option<serde_json::Value>,
        latency_ms: u64,
        result: &Result<response::Response<Bytes>, Error>,
    ) -> ApiCall {
        let mut call = ApiCall {
            endpoint,
            method,
            params,
            status: None,
            latency_ms,
            success: false,
            error_message: None,
            weight_used: None,
            weight_remaining: None,
        };
        match result {
            Ok(response) => {
                let status = response.status();
                call.status = Some(status.as_u16());
                call.success = status.is_success();
                if !call.success {
                    call.error_message =
                        Some(Error::from_response(status, response.body()).to_string());
                }
                call.weight_used = used_weight(response.headers());
                call.weight_remaining = call
                    .weight_used
                    .map(|used| self.weight_limit.saturating_sub(used));
            }
            Err(err) => call.error_message = Some(err.to_string()),
        }
        return call;
    }
}

#[async_trait]
impl Client for RestClient {
    fn url(&self, endpoint: &str) -> Result<Url, Error> {
        let url = self.base_url.join(endpoint.trim_start_matches('/'))?;

        return Ok(url);
    }

    async fn exec(&self, request: request::Builder) -> Result<response::Response<Bytes>, Error> {
        let mut http_request = request.body(Vec::new())?;
        if let Some(api_key) = &self.api_key {
            http_request
                .headers_mut()
                .insert(API_KEY_HEADER, HeaderValue::from_str(api_key)?);
        }
        let endpoint = http_request.uri().path().to_owned();
        let method = http_request.method().to_string();
        let params = http_request.uri().query().map(query_to_json);

        let started = Instant::now();
        let result = self.send(http_request).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let call = self.record(endpoint, method, params, latency_ms, &result);
        match call.success {
            true => debug!("{} {} ({}ms)", call.method, call.endpoint, call.latency_ms),
            false => warn!(
                "{} {} failed ({}ms): {}",
                call.method,
                call.endpoint,
                call.latency_ms,
                call.error_message.as_deref().unwrap_or_default()
            ),
        }
        if let Some(used) = call.weight_used {
            if u64::from(used) * 10 >= u64::from(self.weight_limit) * 8 {
                warn!("Request weight {used}/{} used this minute", self.weight_limit);
            }
        }
        if let Some(observer) = &self.observer {
            observer.on_call(&call);
        }
        return result;
    }
}

fn used_weight(headers: &HeaderMap) -> Option<u32> {
    return headers
        .get(USED_WEIGHT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok());
}

fn query_to_json(query: &str) -> serde_json::Value {
    let params: serde_json::Map<String, serde_json::Value> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), serde_json::Value::String(value.into_owned())))
        .collect();
    return serde_json::Value::Object(params);
}

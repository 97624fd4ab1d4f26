use std::borrow::Cow;

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::Deserialize;

use crate::rest::endpoint::Endpoint;

/// `GET /api/v3/ping`, answers `{}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ping;

#[derive(Debug, Clone, Deserialize)]
pub struct Pong {}

impl Endpoint for Ping {
    fn endpoint(&self) -> Cow<'static, str> {
        return Cow::Borrowed("api/v3/ping");
    }
}

/// `GET /api/v3/time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerTime;

#[derive(Debug, Clone, Getters, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTimeResponse {
    server_time: i64,
}

impl ServerTimeResponse {
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        return DateTime::from_timestamp_millis(self.server_time);
    }
}

impl Endpoint for ServerTime {
    fn endpoint(&self) -> Cow<'static, str> {
        return Cow::Borrowed("api/v3/time");
    }
}

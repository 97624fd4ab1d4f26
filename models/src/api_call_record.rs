use chrono::{DateTime, Utc};
use derive_builder::Builder;
use derive_getters::Getters;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::api_call_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApiCallRecord {
    id: i64,
    endpoint: String,
    method: String,
    request_params: Option<serde_json::Value>,
    response_status: Option<i32>,
    response_time_ms: i32,
    success: bool,
    error_message: Option<String>,
    weight_used: Option<i32>,
    weight_remaining: Option<i32>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Builder, Getters, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::api_call_records)]
pub struct NewApiCallRecord {
    endpoint: String,
    #[builder(default = "\"GET\".to_owned()")]
    method: String,
    #[builder(default)]
    request_params: Option<serde_json::Value>,
    #[builder(default)]
    response_status: Option<i32>,
    response_time_ms: i32,
    success: bool,
    #[builder(default)]
    error_message: Option<String>,
    #[builder(default)]
    weight_used: Option<i32>,
    #[builder(default)]
    weight_remaining: Option<i32>,
}

impl NewApiCallRecord {
    pub fn into_api_call_record(self, id: i64, created_at: DateTime<Utc>) -> ApiCallRecord {
        return ApiCallRecord {
            id,
            endpoint: self.endpoint,
            method: self.method,
            request_params: self.request_params,
            response_status: self.response_status,
            response_time_ms: self.response_time_ms,
            success: self.success,
            error_message: self.error_message,
            weight_used: self.weight_used,
            weight_remaining: self.weight_remaining,
            created_at,
        };
    }
}

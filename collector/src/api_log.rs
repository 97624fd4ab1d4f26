use std::sync::Arc;

use binance_api::{ApiCall, CallObserver};
use models::{api_call_record::NewApiCallRecordBuilder, NewApiCallRecord};
use store::Store;
use tracing::warn;

/// Writes every Binance call to `api_call_records`.
pub struct StoreObserver {
    store: Arc<dyn Store>,
}

impl StoreObserver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        return Self { store };
    }
}

impl CallObserver for StoreObserver {
    fn on_call(&self, call: &ApiCall) {
        match record_from_call(call) {
            Ok(record) => self.store.log_api_call(&record),
            Err(err) => warn!("Dropping api call record for {}: {err:#}", call.endpoint()),
        }
    }
}

fn clamp(value: u64) -> i32 {
    return i32::try_from(value).unwrap_or(i32::MAX);
}

pub fn record_from_call(call: &ApiCall) -> anyhow::Result<NewApiCallRecord> {
    let record = NewApiCallRecordBuilder::default()
        .endpoint(call.endpoint().to_owned())
        .method(call.method().to_owned())
        .request_params(call.params().clone())
        .response_status(call.status().map(i32::from))
        .response_time_ms(clamp(*call.latency_ms()))
        .success(*call.success())
        .error_message(call.error_message().clone())
        .weight_used(call.weight_used().map(|weight| clamp(weight.into())))
        .weight_remaining(call.weight_remaining().map(|weight| clamp(weight.into())))
        .build()?;
    return Ok(record);
}

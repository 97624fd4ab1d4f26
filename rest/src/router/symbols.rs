use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use models::{Candle, PriceSummary, TickerSnapshot};
use serde::Deserialize;
use types::Interval;

use crate::{error::AppError, AppState};

const DEFAULT_HISTORY_LIMIT: i64 = 100;

pub fn create_router() -> Router<AppState> {
    let router = Router::new()
        .route("/:symbol/history", get(history))
        .route("/:symbol/stats", get(stats))
        .route("/:symbol/candles", get(candles));

    return router;
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<i64>,
}

/// Newest snapshots first.
async fn history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<TickerSnapshot>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    return Ok(Json(state.store.symbol_history(&symbol.to_uppercase(), limit)?));
}

/// Highest, lowest, average and range over the same window `history` returns.
async fn stats(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<PriceSummary>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let window = state.store.symbol_history(&symbol.to_uppercase(), limit)?;
    return Ok(Json(PriceSummary::from_snapshots(&window)));
}

/// `start` and `end` are inclusive epoch milliseconds on the open time.
#[derive(Debug, Deserialize)]
struct CandleRange {
    interval: Interval,
    start: Option<i64>,
    end: Option<i64>,
}

async fn candles(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(range): Query<CandleRange>,
) -> Result<Json<Vec<Candle>>, AppError> {
    let start = range.start.unwrap_or(0);
    let end = range.end.unwrap_or(i64::MAX);
    if start > end {
        return Err(AppError::bad_request(format!("start {start} is after end {end}")));
    }
    let candles = state
        .store
        .candles(&symbol.to_uppercase(), range.interval, start, end)?;
    return Ok(Json(candles));
}

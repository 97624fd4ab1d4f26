use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use models::{FetchJobSchedule, TradingPair};
use serde::{Deserialize, Serialize};
use store::{SymbolActivity, TableCounts};

use crate::{error::AppError, AppState};

pub fn create_router() -> Router<AppState> {
    let router = Router::new()
        .route("/pairs", get(pairs))
        .route("/jobs", get(jobs))
        .route("/stats", get(stats));

    return router;
}

#[derive(Debug, Deserialize)]
struct PairFilter {
    #[serde(default)]
    active_only: bool,
}

async fn pairs(
    State(state): State<AppState>,
    Query(filter): Query<PairFilter>,
) -> Result<Json<Vec<TradingPair>>, AppError> {
    return Ok(Json(state.store.list_trading_pairs(filter.active_only)?));
}

async fn jobs(State(state): State<AppState>) -> Result<Json<Vec<FetchJobSchedule>>, AppError> {
    return Ok(Json(state.store.list_fetch_jobs()?));
}

#[derive(Debug, Serialize)]
struct Stats {
    tables: TableCounts,
    symbols: Vec<SymbolActivity>,
}

async fn stats(State(state): State<AppState>) -> Result<Json<Stats>, AppError> {
    let stats = Stats {
        tables: state.store.table_counts()?,
        symbols: state.store.symbol_activity()?,
    };
    return Ok(Json(stats));
}

use axum::{extract::State, routing::get, Json, Router};
use models::{ApiStat, LatestCandle, LatestPrice};

use crate::{error::AppError, AppState};

pub fn create_router() -> Router<AppState> {
    let router = Router::new()
        .route("/prices/latest", get(latest_prices))
        .route("/candles/latest", get(latest_candles))
        .route("/api-stats", get(api_stats));

    return router;
}

async fn latest_prices(State(state): State<AppState>) -> Result<Json<Vec<LatestPrice>>, AppError> {
    return Ok(Json(state.store.latest_prices()?));
}

async fn latest_candles(
    State(state): State<AppState>,
) -> Result<Json<Vec<LatestCandle>>, AppError> {
    return Ok(Json(state.store.latest_candles()?));
}

async fn api_stats(State(state): State<AppState>) -> Result<Json<Vec<ApiStat>>, AppError> {
    return Ok(Json(state.store.api_stats()?));
}

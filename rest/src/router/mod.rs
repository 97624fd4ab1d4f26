mod overview;
mod symbols;
mod views;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any);
    let router = Router::new()
        .merge(views::create_router())
        .merge(overview::create_router())
        .nest("/symbols", symbols::create_router())
        .with_state(state)
        .layer(cors);

    return router;
}

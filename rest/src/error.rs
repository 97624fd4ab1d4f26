use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use store::StoreError;
use tracing::error;

/// Any handler failure. Store errors pick their status, everything else is a 500.
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        return Self {
            status: StatusCode::BAD_REQUEST,
            error: anyhow::anyhow!(message.into()),
        };
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{:#}", self.error);
        }
        let body = Json(serde_json::json!({ "error": format!("{:#}", self.error) }));
        return (self.status, body).into_response();
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::Invalid { .. } => StatusCode::BAD_REQUEST,
            StoreError::UnknownSymbol { .. } => StatusCode::NOT_FOUND,
            StoreError::UniquenessConflict { .. } => StatusCode::CONFLICT,
            StoreError::Transient { .. } => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Database { .. } | StoreError::PartialCleanup { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        return Self {
            status,
            error: err.into(),
        };
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        return Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err,
        };
    }
}

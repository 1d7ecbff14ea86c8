use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use innkeep_core::CoreError;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct AppError(#[from] pub CoreError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.0 {
            CoreError::Validation(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            CoreError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            CoreError::RoomUnavailable(_)
            | CoreError::InvalidTransition { .. }
            | CoreError::AlreadyPaid(_)
            | CoreError::AlreadyCancelled(_) => (StatusCode::CONFLICT, self.0.to_string()),
            CoreError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

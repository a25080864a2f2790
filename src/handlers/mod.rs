pub mod accounts;
pub mod delegations;
pub mod operations;

use axum::{http::StatusCode, Json};

use crate::error::RpcError;
use crate::models::error::ErrorResponse;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a failed lookup to its HTTP response; unknown accounts are 404,
/// anything else is an upstream failure
pub fn upstream_error(context: &str, error: RpcError) -> ApiError {
    if error.is_not_found() {
        tracing::info!("{}: {}", context, error);
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: error.to_string(),
            }),
        );
    }

    tracing::error!("{}: {}", context, error);
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: format!("{}: {}", context, error),
        }),
    )
}

pub fn bad_request(message: String) -> ApiError {
    tracing::debug!("Rejected request: {}", message);
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

/// Handler for GET /
pub async fn health() -> &'static str {
    "Hive stats backend is running"
}

//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{EngineError, ErrorKind};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// The acting user could not be identified.
    Unauthorized(String),
    /// Engine error, mapped by its kind.
    Engine(EngineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Engine(err) => engine_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn engine_error_to_response(err: EngineError) -> (StatusCode, String) {
    match err.kind() {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        ErrorKind::Conflict => (StatusCode::CONFLICT, err.to_string()),
        ErrorKind::Infrastructure => {
            tracing::error!(error = ?err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_store::StoreError;

    #[test]
    fn test_engine_kinds_map_to_status() {
        let not_found: ApiError = EngineError::NotFound {
            entity: "stock",
            key: "S1".to_string(),
        }
        .into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let conflict: ApiError = EngineError::DuplicateVariant {
            product_id: "P1".into(),
            name: "Red".to_string(),
        }
        .into();
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let infra: ApiError = EngineError::Infrastructure {
            operation: "insert stock",
            source: StoreError::Injected("write 1".to_string()),
        }
        .into();
        assert_eq!(
            infra.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use backoffice_core::{LiveError, StoreError};
use serde::Serialize;
use thiserror::Error;

/// JSON error envelope. Callers branch on `success`, not only on the status code.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Live sessions error: {0}")]
    LiveSessions(#[from] LiveError),

    #[error("Route not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::LiveSessions(err) => {
                let message = err.to_string();
                if err.is_timeout() {
                    tracing::error!(error = %message, "Active sessions aggregation timed out");
                    (
                        StatusCode::GATEWAY_TIMEOUT,
                        ErrorResponse::with_message(
                            "Tempo limite excedido ao buscar sessões ativas",
                            message,
                        ),
                    )
                } else {
                    tracing::error!(
                        error = %message,
                        relation = store_relation(err).unwrap_or("-"),
                        sqlstate = store_code(err).unwrap_or("-"),
                        "Active sessions aggregation failed"
                    );
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::with_message(
                            "Erro interno ao buscar sessões ativas",
                            message,
                        ),
                    )
                }
            }
            ApiError::NotFound(path) => {
                tracing::debug!(path = %path, "Route not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_message("Recurso não encontrado", path.clone()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

fn store_error(err: &LiveError) -> Option<&StoreError> {
    match err {
        LiveError::ActiveRecords(source) | LiveError::Lookup { source, .. } => Some(source),
        LiveError::DeadlineExceeded(_) => None,
    }
}

fn store_relation(err: &LiveError) -> Option<&'static str> {
    store_error(err).and_then(StoreError::relation)
}

fn store_code(err: &LiveError) -> Option<&str> {
    match store_error(err)? {
        StoreError::Query { code, .. } => code.as_deref(),
        StoreError::Unavailable(_) => None,
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use backoffice_core::Lookup;
    use std::time::Duration;

    /// Helper to extract status code and body from a response
    async fn extract_response(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        (status, error_response)
    }

    #[tokio::test]
    async fn test_active_records_failure_returns_500_envelope() {
        let error = ApiError::from(LiveError::ActiveRecords(StoreError::query(
            "registro_tempo",
            "permission denied for schema",
        )));
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.success);
        assert_eq!(body.error, "Erro interno ao buscar sessões ativas");
        assert!(body.message.unwrap().contains("permission denied for schema"));
    }

    #[tokio::test]
    async fn test_lookup_failure_returns_500_envelope() {
        let error = ApiError::from(LiveError::Lookup {
            lookup: Lookup::Tasks,
            source: StoreError::Unavailable("pool timed out".into()),
        });
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.message.unwrap().starts_with("failed to load tasks"));
    }

    #[tokio::test]
    async fn test_deadline_returns_504_envelope() {
        let error = ApiError::from(LiveError::DeadlineExceeded(Duration::from_secs(10)));
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(!body.success);
        assert_eq!(body.error, "Tempo limite excedido ao buscar sessões ativas");
    }

    #[tokio::test]
    async fn test_not_found_returns_404_envelope() {
        let error = ApiError::NotFound("/api/nope".into());
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message.as_deref(), Some("/api/nope"));
    }

    #[test]
    fn test_error_response_omits_missing_message() {
        let json = serde_json::to_value(ErrorResponse::new("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "boom"}));
    }
}

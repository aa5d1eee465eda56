//! HTTP error responses.
//!
//! Client mistakes answer 400 with `{ error }`. Everything else answers 500
//! with `{ error, details, type }`, where `type` names the failing stage.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::extract::ExtractionError;
use crate::service::ServiceError;

/// Stage that produced a server-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Extraction,
    Provider,
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Extraction => "ExtractionError",
            FailureKind::Provider => "ProviderError",
            FailureKind::Internal => "InternalError",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}: {details}")]
    Failed {
        message: &'static str,
        details: String,
        kind: FailureKind,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// Map an extraction failure. Rejected file types are the client's fault.
    pub fn extraction(err: ExtractionError, message: &'static str) -> Self {
        if err.is_client_error() {
            return ApiError::BadRequest(err.to_string());
        }
        ApiError::Failed {
            message,
            details: err.to_string(),
            kind: FailureKind::Extraction,
        }
    }

    /// Map a pipeline failure. Validation errors are the client's fault.
    pub fn service(err: ServiceError, message: &'static str) -> Self {
        if err.is_client_error() {
            return ApiError::BadRequest(err.to_string());
        }
        ApiError::Failed {
            message,
            details: err.to_string(),
            kind: FailureKind::Provider,
        }
    }

    pub fn internal(message: &'static str, details: impl ToString) -> Self {
        ApiError::Failed {
            message,
            details: details.to_string(),
            kind: FailureKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(message) => json!({ "error": message }),
            ApiError::Failed {
                message,
                details,
                kind,
            } => {
                error!(kind = kind.as_str(), %details, "{}", message);
                json!({
                    "error": message,
                    "details": details,
                    "type": kind.as_str(),
                })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    #[test]
    fn test_extraction_mapping() {
        let err = ApiError::extraction(ExtractionError::UnsupportedFileType(None), "failed");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::extraction(
            ExtractionError::ExtractionFailed("Failed to extract text from PDF"),
            "failed",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(
            err,
            ApiError::Failed { kind: FailureKind::Extraction, ref details, .. }
                if details == "Failed to extract text from PDF"
        ));
    }

    #[test]
    fn test_service_mapping() {
        let err = ApiError::service(ServiceError::MissingTopic, "failed");
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Research topic is required"));

        let err = ApiError::service(ServiceError::Provider(LlmError::Timeout(120)), "failed");
        assert!(matches!(
            err,
            ApiError::Failed { kind: FailureKind::Provider, .. }
        ));
    }

    #[tokio::test]
    async fn test_failure_body_shape() {
        let response = ApiError::internal("Failed to summarize paper. Please try again.", "boom")
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Failed to summarize paper. Please try again.");
        assert_eq!(json["details"], "boom");
        assert_eq!(json["type"], "InternalError");
    }
}

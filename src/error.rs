use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::ai::UpstreamError;

/// Errors surfaced to API clients as `{"error": "<code>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing bearer token")]
    MissingBearerToken,
    #[error("invalid google token")]
    InvalidGoogleToken,
    #[error("missing text or image")]
    MissingTextOrImage,
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("model returned invalid json")]
    ModelReturnedInvalidJson { raw: String },
    #[error("database not configured")]
    DatabaseNotConfigured,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingBearerToken | ApiError::InvalidGoogleToken => StatusCode::UNAUTHORIZED,
            ApiError::MissingTextOrImage | ApiError::InvalidUpload(_) | ApiError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream(_) | ApiError::ModelReturnedInvalidJson { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::DatabaseNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingBearerToken => "missing_bearer_token",
            ApiError::InvalidGoogleToken => "invalid_google_token",
            ApiError::MissingTextOrImage => "missing_text_or_image",
            ApiError::InvalidUpload(_) => "invalid_upload",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::InvalidQuery(_) => "invalid_query",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::ModelReturnedInvalidJson { .. } => "model_returned_invalid_json",
            ApiError::DatabaseNotConfigured => "database_not_configured",
            ApiError::Database(_) => "database_error",
        }
    }
}

/// Maps an axum body rejection onto the API error contract.
pub(crate) fn body_error(status: StatusCode, detail: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::InvalidUpload(detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, code = self.code(), "request failed");
        }
        let body = match &self {
            ApiError::ModelReturnedInvalidJson { raw } => json!({ "error": self.code(), "raw": raw }),
            _ => json!({ "error": self.code() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn auth_errors_are_401() {
        let (status, body) = body_json(ApiError::MissingBearerToken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "missing_bearer_token" }));

        let (status, body) = body_json(ApiError::InvalidGoogleToken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_google_token");
    }

    #[tokio::test]
    async fn invalid_model_json_carries_raw_output() {
        let (status, body) = body_json(ApiError::ModelReturnedInvalidJson {
            raw: "not json".into(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "model_returned_invalid_json");
        assert_eq!(body["raw"], "not json");
    }

    #[tokio::test]
    async fn body_rejections_keep_the_json_shape() {
        let (status, body) =
            body_json(body_error(StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded".into())).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({ "error": "payload_too_large" }));

        let (status, body) = body_json(body_error(StatusCode::BAD_REQUEST, "bad boundary".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "invalid_upload" }));
    }

    #[tokio::test]
    async fn upstream_error_does_not_leak_details() {
        let (status, body) = body_json(ApiError::Upstream(UpstreamError::Status {
            status: 429,
            body: "rate limited, key sk-...".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({ "error": "upstream_error" }));
    }
}

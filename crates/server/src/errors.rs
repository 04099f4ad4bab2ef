use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::ProxyError;
use thiserror::Error;
use tracing::error;

/// Response-side view of [`ProxyError`]. Every failure class becomes a JSON
/// `{error}` envelope: 400 for validation, the upstream's own status for
/// upstream errors, 500 for unreachable/malformed.
#[derive(Debug)]
pub struct ApiError(pub ProxyError);

impl From<ProxyError> for ApiError {
    fn from(e: ProxyError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ProxyError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::Value::String(msg.clone()))
            }
            ProxyError::Upstream { status, .. } => {
                let status =
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, self.0.envelope_message())
            }
            ProxyError::Unreachable(_) | ProxyError::MalformedBody(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.envelope_message())
            }
        };
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

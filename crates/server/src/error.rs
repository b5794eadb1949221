use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use alertflow_ingress::IngressError;

/// API-level errors with their HTTP mapping.
///
/// Responses carry `{error, message}` where `error` is a stable machine
/// code: `badRequest`, `unauthorized`, `conflict`, or `internalError`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller fault in the payload. 400.
    #[error("{0}")]
    BadRequest(String),

    /// Missing/invalid credentials or signature. 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Idempotency replay. 409.
    #[error("{0}")]
    Conflict(String),

    /// Unrecoverable internal fault. 500.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "badRequest",
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<IngressError> for ApiError {
    fn from(err: IngressError) -> Self {
        match err {
            IngressError::Signature(e) => Self::Unauthorized(e.to_string()),
            IngressError::UnknownIntegration => {
                Self::Unauthorized("unknown integration key".to_owned())
            }
            IngressError::Validation(msg) => Self::BadRequest(msg),
            IngressError::Duplicate => {
                Self::Conflict("request already processed".to_owned())
            }
        }
    }
}

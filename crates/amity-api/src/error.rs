use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::error;

use amity_core::Error;

/// Handler-level error: every core taxonomy variant maps to a distinct
/// status code; anything else is a logged 500 with the detail withheld.
pub enum ApiError {
    Domain(Error),
    Internal(String),
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Domain(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Domain(e) => {
                let status = match &e {
                    Error::Validation(_) | Error::InvalidOperation(_) => StatusCode::BAD_REQUEST,
                    Error::Unauthenticated => StatusCode::UNAUTHORIZED,
                    Error::Forbidden(_) => StatusCode::FORBIDDEN,
                    Error::NotFound(_) => StatusCode::NOT_FOUND,
                    Error::DuplicateIdentity(_) | Error::Conflict(_) => StatusCode::CONFLICT,
                    Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                    Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };

                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!("request failed: {e}");
                    return error_body(status, "internal error");
                }

                let mut response = error_body(status, &e.to_string());
                if let Error::RateLimited { retry_after_secs } = e {
                    if let Ok(value) = retry_after_secs.to_string().parse() {
                        response.headers_mut().insert(header::RETRY_AFTER, value);
                    }
                }
                response
            }
            Self::Internal(msg) => {
                error!("request failed: {msg}");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

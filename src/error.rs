// HTTP API Error Types
use axum::{
    extract::rejection::{BytesRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::database::manager::RegistryError;
use crate::database::store::StoreError;
use crate::filter::FilterError;

/// Failure half of an operation outcome, rendered as `{ success, code, error }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error (store failure, message passed through)
    Store(String),

    // Any other status; codes outside the HTTP range fall back to 400
    Status { code: u16, message: String },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Store(_) => 500,
            ApiError::Status { code, .. } => {
                if StatusCode::from_u16(*code).is_ok() {
                    *code
                } else {
                    400
                }
            }
        }
    }

    /// Get client-facing error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Store(msg) => msg,
            ApiError::Status { message, .. } => message,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "code": self.status_code(),
            "error": self.message()
        })
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }

    /// Not found carries no message, matching the store's "no document" signal
    pub fn not_found() -> Self {
        ApiError::NotFound(String::new())
    }

    pub fn store(message: impl Into<String>) -> Self {
        ApiError::Store(message.into())
    }

    /// Build from a loosely typed code, defaulting to 400 when absent
    pub fn with_code(code: Option<u16>, message: impl Into<String>) -> Self {
        ApiError::Status {
            code: code.unwrap_or(400),
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Store error: {}", err);
        ApiError::store(err.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::MissingTenant => ApiError::unauthorized(),
            other => {
                tracing::error!("Tenant connection error: {}", other);
                ApiError::store(other.to_string())
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

// Extractor rejections keep their status but use the error envelope
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::with_code(Some(rejection.status().as_u16()), rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        ApiError::with_code(Some(rejection.status().as_u16()), rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
        (status, Json(self.to_json())).into_response()
    }
}

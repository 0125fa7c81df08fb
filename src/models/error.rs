use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A required field is absent from a snapshot or has the wrong type.
    #[error("missing or mistyped field `{field}` in snapshot at `{path}`")]
    MissingField { path: String, field: &'static str },

    /// The change source reported a transport-level failure for a path.
    #[error("subscription to `{path}` failed: {reason}")]
    Subscription { path: String, reason: String },

    #[error("invalid path `{0}`")]
    InvalidPath(String),
}

impl SyncError {
    pub fn missing_field(path: &str, field: &'static str) -> Self {
        SyncError::MissingField { path: path.to_string(), field }
    }

    pub fn subscription(path: &str, reason: impl Into<String>) -> Self {
        SyncError::Subscription { path: path.to_string(), reason: reason.into() }
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = match &self {
            SyncError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "status": "fail",
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

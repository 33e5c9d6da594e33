use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors surfaced to HTTP clients of the Coordinator (spec.md §7
/// taxonomy). Every variant renders a JSON body with an `error` field and,
/// where applicable, the offending `key`.
#[derive(thiserror::Error, Debug)]
pub enum RouterError {
    #[error("missing or invalid field: {0}")]
    BadRequest(String),

    #[error("ring is empty")]
    RingEmpty,

    #[error("primary unreachable for key {key:?}: {message}")]
    PrimaryUnreachable { key: String, message: String },

    #[error("not found: {key:?}")]
    NotFound { key: String },
}

impl IntoResponse for RouterError {
    fn into_response(self) -> Response {
        let (status, key) = match &self {
            RouterError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            // ring-empty is a programmer error per spec.md §7(b): the
            // config loader already refuses to start without brokers, so
            // this only fires if that invariant is ever violated.
            RouterError::RingEmpty => (StatusCode::INTERNAL_SERVER_ERROR, None),
            RouterError::PrimaryUnreachable { key, .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, Some(key.clone()))
            }
            RouterError::NotFound { key } => (StatusCode::NOT_FOUND, Some(key.clone())),
        };

        let mut body = json!({ "error": self.to_string() });
        if let Some(key) = key {
            body["key"] = json!(key);
        }

        (status, Json(body)).into_response()
    }
}

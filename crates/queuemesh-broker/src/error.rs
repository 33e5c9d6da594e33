use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum BrokerError {
    #[error("missing or invalid field: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let (status, key) = match &self {
            BrokerError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            BrokerError::NotFound(key) => (StatusCode::NOT_FOUND, Some(key.clone())),
        };

        let mut body = json!({ "error": self.to_string() });
        if let Some(key) = key {
            body["key"] = json!(key);
        }

        (status, Json(body)).into_response()
    }
}

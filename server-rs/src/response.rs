use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Success envelope: `{ "success": true, "message": ..., "data": ... }`.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    message: String,
    data: Option<Value>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, data: impl Serialize) -> Self {
        Self::with_status(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: impl Serialize) -> Self {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    /// An envelope without a `data` member.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }

    fn with_status(status: StatusCode, message: impl Into<String>, data: impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Value::Null
            }
        };
        Self {
            status,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let body = match self.data {
            Some(data) => json!({ "success": true, "message": self.message, "data": data }),
            None => json!({ "success": true, "message": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

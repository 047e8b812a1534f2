//! The JSON response envelope shared by every endpoint.
//!
//! All responses have the shape `{success, message?, data?}` so that clients
//! can handle success and failure uniformly.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// A successful JSON response with the `{success, message?, data?}` envelope.
///
/// Error responses use the same shape and are produced by
/// [Error](crate::Error)'s `IntoResponse` impl.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize = serde_json::Value> {
    #[serde(skip)]
    status: StatusCode,

    success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// A 201 response carrying `data`, for newly created resources.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    /// Attach a human readable message to the response.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<serde_json::Value> {
    /// A 200 response with a message and no data.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ApiResponse;

    #[test]
    fn ok_response_serializes_data() {
        let response = ApiResponse::ok(json!({"count": 3}));

        let body = serde_json::to_value(&response).unwrap();

        assert_eq!(body, json!({"success": true, "data": {"count": 3}}));
    }

    #[test]
    fn message_only_response_omits_data() {
        let response = ApiResponse::message_only("Category deleted successfully");

        let body = serde_json::to_value(&response).unwrap();

        assert_eq!(
            body,
            json!({"success": true, "message": "Category deleted successfully"})
        );
    }

    #[test]
    fn explicit_null_data_is_kept() {
        let response = ApiResponse::ok(serde_json::Value::Null);

        let body = serde_json::to_value(&response).unwrap();

        assert_eq!(body, json!({"success": true, "data": null}));
    }
}

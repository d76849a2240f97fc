//! Standard API response types

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Response for single data item
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Simple message response, used for deletes and other acknowledgements
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_response_wraps_payload() {
        let body = serde_json::to_value(DataResponse::new(vec![1, 2])).unwrap();
        assert_eq!(body, serde_json::json!({ "data": [1, 2] }));
    }

    #[test]
    fn message_response_is_flat() {
        let body = serde_json::to_value(MessageResponse::new("done")).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "done" }));
    }
}

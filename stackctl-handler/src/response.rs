//! Platform-shaped responses: `statusCode` plus a JSON string body.

use serde::Serialize;
use serde_json::{json, Value};

/// Response status codes.
pub mod status {
    pub const SUCCESS: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// Handler response in the hosting platform's envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-serialized body.
    pub body: String,
}

impl ActionResponse {
    pub fn with_status(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::with_status(status::SUCCESS, body)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::with_status(status::BAD_REQUEST, json!({ "message": message }))
    }

    pub fn not_found(body: Value) -> Self {
        Self::with_status(status::NOT_FOUND, body)
    }

    pub fn internal_error(message: &str, error: &str) -> Self {
        Self::with_status(
            status::INTERNAL_SERVER_ERROR,
            json!({ "message": message, "error": error }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_serialized_json() {
        let response = ActionResponse::ok(json!({ "message": "done" }));
        assert_eq!(response.status_code, status::SUCCESS);
        let body: Value = serde_json::from_str(&response.body).expect("body should be JSON");
        assert_eq!(body["message"], "done");
    }

    #[test]
    fn envelope_uses_platform_field_names() {
        let response = ActionResponse::bad_request("nope");
        let envelope = serde_json::to_value(&response).expect("serializable");
        assert!(envelope.get("statusCode").is_some());
        assert!(envelope.get("body").is_some());
    }
}

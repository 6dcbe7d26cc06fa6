//! JSON body shared by the upload and key-check endpoints.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{success, message, url?, max_file_size?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable outcome.
    pub message: &'static str,
    /// Download URL of an accepted upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Size limit, reported on a successful key check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
}

impl ApiResponse {
    /// A failure carrying only a message.
    #[must_use]
    pub fn failure(message: &'static str) -> Self {
        Self {
            success: false,
            message,
            url: None,
            max_file_size: None,
        }
    }

    /// An accepted upload.
    #[must_use]
    pub fn uploaded(url: String) -> Self {
        Self {
            success: true,
            message: "File uploaded successfully",
            url: Some(url),
            max_file_size: None,
        }
    }

    /// A valid API key.
    #[must_use]
    pub fn key_valid(max_file_size: u64) -> Self {
        Self {
            success: true,
            message: "API key is valid",
            url: None,
            max_file_size: Some(max_file_size),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_are_omitted() {
        let value = serde_json::to_value(ApiResponse::failure("File too large")).unwrap();
        assert_eq!(value, json!({"success": false, "message": "File too large"}));
    }

    #[test]
    fn test_uploaded_carries_url() {
        let value =
            serde_json::to_value(ApiResponse::uploaded("https://x/download/a.png".into())).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "message": "File uploaded successfully",
                "url": "https://x/download/a.png"
            })
        );
    }

    #[test]
    fn test_key_valid_reports_limit() {
        let value = serde_json::to_value(ApiResponse::key_valid(2048)).unwrap();
        assert_eq!(value["max_file_size"], 2048);
        assert_eq!(value["message"], "API key is valid");
    }
}

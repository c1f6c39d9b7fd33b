//! Error types for the chatbot client.

use thiserror::Error;

/// Errors that can occur when talking to the chat-completions API.
#[derive(Debug, Error)]
pub enum ChatbotError {
    /// No API key is configured.
    #[error("chatbot is not configured")]
    NotConfigured,

    /// Client could not be built from configuration.
    #[error("invalid chatbot configuration: {0}")]
    Config(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Failed to parse the response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The API answered without any text.
    #[error("empty reply")]
    EmptyReply,
}

/// Error body returned by the API.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

impl ApiError {
    /// Message prefixed with the error type when the API sent one.
    #[must_use]
    pub fn describe(self) -> String {
        match self.error_type {
            Some(kind) => format!("{kind}: {}", self.message),
            None => self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chatbot_error_display() {
        let err = ChatbotError::RateLimited(20);
        assert_eq!(err.to_string(), "rate limited, retry after 20 seconds");

        let err = ChatbotError::Api {
            status: 400,
            message: "bad model".to_string(),
        };
        assert_eq!(err.to_string(), "API error (400): bad model");
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error.message, "Incorrect API key provided");
        assert_eq!(
            response.error.error_type.as_deref(),
            Some("invalid_request_error")
        );
        assert_eq!(
            response.error.describe(),
            "invalid_request_error: Incorrect API key provided"
        );
    }

    #[test]
    fn test_describe_without_type() {
        let response: ApiErrorResponse =
            serde_json::from_str(r#"{"error": {"message": "overloaded"}}"#).expect("deserialize");
        assert_eq!(response.error.describe(), "overloaded");
    }
}

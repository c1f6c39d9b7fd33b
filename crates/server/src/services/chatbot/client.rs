//! Chat-completions HTTP client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::{ApiErrorResponse, ChatbotError};
use crate::config::OpenAiConfig;

/// Upper bound on reply length.
const DEFAULT_MAX_TOKENS: u32 = 800;

/// Low temperature keeps answers close to the supplied facts.
const DEFAULT_TEMPERATURE: f32 = 0.4;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Who wrote a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    #[must_use]
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct ChatbotClient {
    inner: Arc<ChatbotClientInner>,
}

struct ChatbotClientInner {
    client: reqwest::Client,
    model: String,
    endpoint: String,
}

impl ChatbotClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `ChatbotError::Config` if the API key is not a valid header value
    /// or the HTTP client cannot be built.
    pub fn new(config: &OpenAiConfig) -> Result<Self, ChatbotError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
                .map_err(|_| ChatbotError::Config("API key contains invalid characters".into()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChatbotError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ChatbotClientInner {
                client,
                model: config.model.clone(),
                endpoint: format!(
                    "{}/chat/completions",
                    config.base_url.trim_end_matches('/')
                ),
            }),
        })
    }

    /// Model name sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Send a conversation and return the assistant's reply text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with an error
    /// status, or the reply is empty.
    #[instrument(skip(self, messages), fields(model = %self.inner.model, turns = messages.len()))]
    pub async fn complete(&self, messages: &[ChatTurn]) -> Result<String, ChatbotError> {
        let request = CompletionRequest {
            model: &self.inner.model,
            messages,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        parse_reply(&body)
    }

    /// Map an error status to a `ChatbotError`.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ChatbotError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ChatbotError::RateLimited(retry_after);
        }

        match response.text().await {
            Ok(body) => {
                let message = serde_json::from_str::<ApiErrorResponse>(&body)
                    .map_or(body, |e| e.error.describe());
                ChatbotError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
            Err(e) => ChatbotError::Http(e),
        }
    }
}

/// Extract the first choice's text from a completion body.
fn parse_reply(body: &str) -> Result<String, ChatbotError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| ChatbotError::Parse(format!("Failed to parse response: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(ChatbotError::EmptyReply)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_parse_reply_takes_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  Vendiste 12 pedidos. "}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        }"#;
        assert_eq!(parse_reply(body).unwrap(), "Vendiste 12 pedidos.");
    }

    #[test]
    fn test_parse_reply_empty() {
        assert!(matches!(
            parse_reply(r#"{"choices": []}"#),
            Err(ChatbotError::EmptyReply)
        ));
        assert!(matches!(
            parse_reply(r#"{"choices": [{"message": {"content": null}}]}"#),
            Err(ChatbotError::EmptyReply)
        ));
        assert!(matches!(parse_reply("not json"), Err(ChatbotError::Parse(_))));
    }

    #[test]
    fn test_request_serialization() {
        let turns = vec![
            ChatTurn::new(ChatRole::System, "facts"),
            ChatTurn::new(ChatRole::User, "hola"),
        ];
        let request = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &turns,
            max_tokens: 10,
            temperature: 0.5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hola");
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = OpenAiConfig {
            api_key: SecretString::from("sk-test"),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.example.com/v1/".to_string(),
        };
        let client = ChatbotClient::new(&config).unwrap();
        assert_eq!(
            client.inner.endpoint,
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(client.model(), "gpt-4o-mini");
    }
}

//! OpenAI Provider Implementation
//!
//! Sends one chat-completions request per call: a system message carrying
//! the extraction instruction and a user message carrying the document text.
//!
//! # Features
//!
//! - Async HTTP communication with the chat-completions API
//! - Configurable base URL, model and temperature
//! - Client-side request timeout
//! - Status codes mapped onto `LlmError` variants
//!
//! No retries are performed; a failed call is reported once.
//!
//! # Examples
//!
//! ```no_run
//! use kaiva_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new("sk-...").unwrap()
//!     .with_model("gpt-4")
//!     .with_temperature(0.0);
//! ```

use crate::LlmError;
use async_trait::async_trait;
use kaiva_domain::traits::LlmProvider as LlmProviderTrait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default timeout for a completion request (2 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI chat-completions provider
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider with the default base URL, model and timeout
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the key is empty or the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with an explicit request timeout
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            client,
        })
    }

    /// Point the provider at a different API root (proxies, tests)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Model name sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// First characters of the key, safe to log
    pub fn key_prefix(&self) -> String {
        self.api_key.chars().take(6).collect()
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: self.temperature,
        };

        debug!(model = %self.model, user_chars = user.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, error_text, &self.model));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response contained no message content".to_string()))
    }
}

fn map_status(status: StatusCode, body: String, model: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::Authentication(format!("HTTP {}: {}", status, body))
        }
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
        StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
        _ => LlmError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

#[async_trait]
impl LlmProviderTrait for OpenAiProvider {
    type Error = LlmError;

    async fn generate(&self, system: &str, user: &str) -> Result<String, Self::Error> {
        self.complete(system, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    /// Serve `app` on an ephemeral port and return its base URL
    async fn spawn_fake_api(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new("sk-test-123456").unwrap();
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.model(), DEFAULT_MODEL);
        assert_eq!(provider.temperature, 0.0);
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = OpenAiProvider::new("   ");
        assert!(matches!(result, Err(LlmError::Config(_))));
    }

    #[test]
    fn test_builder_setters() {
        let provider = OpenAiProvider::new("sk-test")
            .unwrap()
            .with_base_url("http://localhost:9999/v1/")
            .with_model("gpt-4o")
            .with_temperature(0.2);
        assert_eq!(provider.base_url, "http://localhost:9999/v1");
        assert_eq!(provider.model(), "gpt-4o");
        assert_eq!(provider.temperature, 0.2);
    }

    #[test]
    fn test_key_prefix() {
        let provider = OpenAiProvider::new("sk-abcdefghijk").unwrap();
        assert_eq!(provider.key_prefix(), "sk-abc");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "bad key".into(), "m"),
            LlmError::Authentication(_)
        ));
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, String::new(), "m"),
            LlmError::RateLimitExceeded
        );
        assert_eq!(
            map_status(StatusCode::NOT_FOUND, String::new(), "gpt-x"),
            LlmError::ModelNotAvailable("gpt-x".to_string())
        );
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, String::new(), "m"),
            LlmError::Communication(_)
        ));
    }

    #[tokio::test]
    async fn test_generate_returns_first_choice() {
        let app = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["messages"][1]["content"], "lease text");
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "{'Late Fee': '5%'}"}}]
                }))
            }),
        );
        let base = spawn_fake_api(app).await;

        let provider = OpenAiProvider::new("sk-test").unwrap().with_base_url(base);
        let reply = provider.generate("instructions", "lease text").await.unwrap();
        assert_eq!(reply, "{'Late Fee': '5%'}");
    }

    #[tokio::test]
    async fn test_generate_unauthorized() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (AxumStatus::UNAUTHORIZED, "Incorrect API key provided") }),
        );
        let base = spawn_fake_api(app).await;

        let provider = OpenAiProvider::new("sk-wrong").unwrap().with_base_url(base);
        let result = provider.generate("s", "u").await;
        assert!(matches!(result, Err(LlmError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_generate_malformed_body() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({"unexpected": true})) }),
        );
        let base = spawn_fake_api(app).await;

        let provider = OpenAiProvider::new("sk-test").unwrap().with_base_url(base);
        let result = provider.generate("s", "u").await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_generate_empty_choices() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let base = spawn_fake_api(app).await;

        let provider = OpenAiProvider::new("sk-test").unwrap().with_base_url(base);
        let result = provider.generate("s", "u").await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_connection_error() {
        // Nothing listens on port 1
        let provider = OpenAiProvider::new("sk-test")
            .unwrap()
            .with_base_url("http://127.0.0.1:1");

        let result = provider.generate("s", "u").await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}

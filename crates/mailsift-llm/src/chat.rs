//! OpenAI-Compatible Chat Provider
//!
//! Talks to any endpoint exposing `POST {endpoint}/chat/completions` in the
//! OpenAI wire format (hosted gateways, LiteLLM proxies, Ollama's `/v1`).
//!
//! # Features
//!
//! - Async HTTP communication with the chat completions API
//! - Configurable endpoint, model and bearer token
//! - Extra headers forwarded verbatim (tenant, region or compartment routing)
//! - Timeout handling
//!
//! Retrying is left to the caller: one `complete` call is one HTTP request.
//!
//! # Examples
//!
//! ```no_run
//! use mailsift_llm::{ChatProvider, ChatProviderConfig};
//!
//! let config = ChatProviderConfig::new("http://localhost:11434/v1", "llama3");
//! let provider = ChatProvider::new(config).unwrap();
//! ```

use crate::LlmError;
use async_trait::async_trait;
use mailsift_domain::traits::CompletionProvider;
use mailsift_domain::{ChatMessage, Conversation};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Default timeout for LLM requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for a chat completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatProviderConfig {
    /// Base URL, without the trailing `/chat/completions`
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Bearer token, if the endpoint requires one
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional headers sent with every request
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ChatProviderConfig {
    /// Settings with no credentials and the default timeout
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            extra_headers: HashMap::new(),
        }
    }
}

/// Chat completions provider
pub struct ChatProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for the chat completions API
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Response from the chat completions API
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatProvider {
    /// Create a new provider
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if a header name or value is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: ChatProviderConfig) -> Result<Self, LlmError> {
        let headers = build_headers(&config)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model,
            client,
        })
    }

    /// Full URL of the completions route
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    /// Send one chat completion request
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The endpoint is unreachable or times out
    /// - The model is not available (404)
    /// - The endpoint is rate limiting (429)
    /// - The response body is not a chat completion
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        debug!("Sending {} messages to {}", messages.len(), self.model);

        let response = self
            .client
            .post(self.completions_url())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response has no message content".to_string()))
    }
}

fn build_headers(config: &ChatProviderConfig) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();

    if let Some(key) = &config.api_key {
        let value = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|e| LlmError::Config(format!("Invalid API key: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
    }

    for (name, value) in &config.extra_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| LlmError::Config(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| LlmError::Config(format!("Invalid value for header '{}': {}", name, e)))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

#[async_trait]
impl CompletionProvider for ChatProvider {
    type Error = LlmError;

    async fn complete(&self, conversation: &Conversation) -> Result<String, Self::Error> {
        self.chat(conversation.messages()).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

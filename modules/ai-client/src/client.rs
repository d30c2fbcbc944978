use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::types::{ChatMessage, ChatRequest, ChatResponse};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for any chat-completions endpoint speaking the OpenAI wire format.
#[derive(Clone)]
pub struct ChatClient {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
            http,
        }
    }

    /// Point the client at an OpenAI-compatible gateway instead.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One system message, one user message, assistant text out.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .message(ChatMessage::system(system))
            .message(ChatMessage::user(user))
            .temperature(0.3)
            .max_tokens(4096);

        debug!(model = %self.model, "chat completion request");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("chat completions request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(anyhow!("Chat API returned {status}: {body}"));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("chat completions response was not valid JSON")?;

        parsed
            .first_text()
            .ok_or_else(|| anyhow!("Chat API returned no choices"))
    }
}

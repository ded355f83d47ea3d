//! Summary service backed by Anthropic's Messages API.

use super::SummaryService;
use crate::config::Ai;
use crate::error::SummaryServiceError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicClient {
    /// Builds a client from the `[ai]` settings. Fails when no API key is
    /// configured or in the environment.
    pub fn from_config(ai: &Ai) -> Result<AnthropicClient, SummaryServiceError> {
        let api_key = ai
            .api_key()
            .ok_or_else(|| SummaryServiceError::MissingApiKey(ai.api_key_env.clone()))?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .use_rustls_tls()
            .build()
            .map_err(|e| {
                SummaryServiceError::Transport(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(AnthropicClient {
            client,
            base_url: ai
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: ai.model.clone(),
            max_tokens: ai.max_tokens,
            temperature: ai.temperature,
        })
    }
}

impl SummaryService for AnthropicClient {
    fn summarize(&self, prompt: &str) -> Result<String, SummaryServiceError> {
        tracing::debug!(
            model = %self.model,
            max_tokens = self.max_tokens,
            temperature = self.temperature,
            "requesting summary"
        );

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| SummaryServiceError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(&response.text().unwrap_or_default());
            return Err(SummaryServiceError::from_status(status.as_u16(), message));
        }

        let body: MessagesResponse = response
            .json()
            .map_err(|e| SummaryServiceError::MalformedResponse(e.to_string()))?;
        extract_text(body)
    }
}

fn extract_text(body: MessagesResponse) -> Result<String, SummaryServiceError> {
    let text: String = body
        .content
        .into_iter()
        .filter(|block| block.content_type == "text")
        .filter_map(|block| block.text)
        .collect();
    let text = text.trim();
    if text.is_empty() {
        return Err(SummaryServiceError::MalformedResponse(
            "response has no text content".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// The `error.message` of an API error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(ToString::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

//! HTTP client for an Anthropic-style messages endpoint.
//!
//! Two modes are supported:
//! - Direct: the API key travels in `x-api-key` and the reply is the full
//!   messages response (`content[0].text`).
//! - Proxy: a key-hiding proxy injects the key and the model and replies with
//!   `{ "content": "..." }`.

use crate::config::LlmConfig;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Protocol version header sent in direct mode.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Message in a messages request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Messages API request body.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    system: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// Direct-mode response.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Proxy-mode response.
#[derive(Debug, Deserialize)]
struct ProxyResponse {
    content: String,
}

/// Thin client shared by the extractor and the generator.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
    http_client: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn request_body<'a>(&'a self, system: &'a str, prompt: &str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: (!self.config.proxy_mode).then_some(self.config.model.as_str()),
            system,
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    /// Send one system + user prompt and return the reply text.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = self.request_body(system, prompt);

        let mut builder = self.http_client.post(&self.config.api_url).json(&request);
        if !self.config.proxy_mode {
            let key = self
                .config
                .api_key
                .as_deref()
                .ok_or_else(|| anyhow!("No API key configured"))?;
            builder = builder
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION);
        }

        debug!("Sending {} character prompt to {}", prompt.len(), self.config.api_url);

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow!("Request timed out after {}s", self.config.timeout_seconds)
            } else if e.is_connect() {
                anyhow!("Cannot connect to LLM endpoint at {}", self.config.api_url)
            } else {
                anyhow!("Failed to send request: {}", e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("LLM API error {}: {}", status, error_message(&body));
        }

        let body = response
            .text()
            .await
            .context("Failed to read LLM response")?;

        parse_reply(&body, self.config.proxy_mode)
    }
}

/// Pull the reply text out of a response body.
pub fn parse_reply(body: &str, proxy_mode: bool) -> Result<String> {
    if proxy_mode {
        let reply: ProxyResponse =
            serde_json::from_str(body).context("Failed to parse proxy response")?;
        return Ok(reply.content);
    }

    let reply: MessagesResponse =
        serde_json::from_str(body).context("Failed to parse messages response")?;
    reply
        .content
        .into_iter()
        .next()
        .map(|block| block.text)
        .ok_or_else(|| anyhow!("Messages response has no content"))
}

/// The `error.message` of an API error body, or the body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direct_reply() {
        let body = r#"{"id":"msg_1","content":[{"type":"text","text":"Hello!"}],"stop_reason":"end_turn"}"#;
        assert_eq!(parse_reply(body, false).unwrap(), "Hello!");
    }

    #[test]
    fn test_parse_proxy_reply() {
        let body = r#"{"content":"Hi from the proxy"}"#;
        assert_eq!(parse_reply(body, true).unwrap(), "Hi from the proxy");
        assert!(parse_reply(body, false).is_err());
    }

    #[test]
    fn test_empty_content_is_an_error() {
        assert!(parse_reply(r#"{"content":[]}"#, false).is_err());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        assert_eq!(error_message(body), "invalid x-api-key");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_proxy_request_omits_model() {
        let config = LlmConfig {
            proxy_mode: true,
            ..LlmConfig::default()
        };
        let client = LlmClient::new(config).unwrap();
        let body = serde_json::to_value(client.request_body("system", "prompt")).unwrap();
        assert!(body.get("model").is_none());
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 1000);

        let direct = LlmClient::new(LlmConfig::default()).unwrap();
        let body = serde_json::to_value(direct.request_body("system", "prompt")).unwrap();
        assert_eq!(body["model"], "claude-3-sonnet-20240229");
        assert_eq!(body["system"], "system");
    }
}

//! OpenAI-compatible chat completions client
//!
//! Shared by the segment planner, code synthesizer and timeline assembler.
//! Works with any provider that speaks the `/chat/completions` wire format.

use serde_json::json;
use std::time::Duration;

use super::CollaboratorError;
use crate::config::LlmConfig;

const USER_AGENT: &str = concat!("mora-gen/", env!("CARGO_PKG_VERSION"));

/// Chat completions client
pub struct ChatClient {
    http_client: reqwest::Client,
    config: LlmConfig,
}

/// Expected shape of the completion content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Free text
    Text,
    /// A single JSON object (`response_format: json_object`)
    JsonObject,
}

impl ChatClient {
    /// Build a client from LLM configuration
    ///
    /// No overall request timeout is set here: every call is bounded by the
    /// stage timeout of the pipeline driver.
    pub fn new(config: LlmConfig) -> Result<Self, CollaboratorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one system + user exchange and return the reply content
    ///
    /// `temperature` overrides the configured default when set.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        format: ResponseFormat,
        temperature: Option<f32>,
    ) -> Result<String, CollaboratorError> {
        let url = format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'));

        let mut body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "stream": false,
            "temperature": temperature.unwrap_or(self.config.temperature),
        });
        if format == ResponseFormat::JsonObject {
            body["response_format"] = json!({ "type": "json_object" });
        }

        tracing::debug!(model = %self.config.model, ?format, "Calling chat completions API");

        let mut request = self.http_client.post(&url).json(&body);

        // Local providers need no key
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Parse(e.to_string()))?;

        let content = value["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CollaboratorError::EmptyResponse("chat completions".to_string()));
        }

        Ok(content.to_string())
    }
}

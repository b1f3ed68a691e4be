//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use almanac_core::config::ExtractionConfig;

use super::CompletionClient;
use super::prompt::{BatchRequest, SYSTEM_PROMPT};
use crate::error::{CompletionError, ServiceError, ServiceResult};

/// Sends each batch to `{base_url}/chat/completions` in JSON mode.
pub struct HttpCompletionClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HttpCompletionClient {
    /// ## Summary
    /// Builds a client from the extraction settings.
    ///
    /// ## Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &ExtractionConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ServiceError::InvalidInput(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    #[tracing::instrument(skip(self, request), fields(lines = request.lines.len()))]
    async fn complete(&self, request: &BatchRequest) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let user_message = request.user_message();

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // A body cut off mid-read is a transport failure, not bad output.
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        message_content(&text)
    }
}

/// Pulls the first choice's message content out of a chat-completions body.
fn message_content(body: &str) -> Result<String, CompletionError> {
    let chat: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::MalformedOutput(e.to_string()))?;

    chat.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::MalformedOutput("response has no message content".to_string()))
}

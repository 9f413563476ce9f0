//! Vision endpoint interaction: build a single-image chat request and send it.
//!
//! This module is intentionally thin. It does not retry, does not interpret
//! the body, and leaves the timeout to the HTTP client unless one is
//! configured. A non-2xx status or a network failure comes back as a
//! [`TransportError`]; the orchestrator decides what that means for the page.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, TransportError};
use crate::pipeline::encode::data_uri;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Error bodies longer than this are cut before being stored in a report.
const MAX_ERROR_BODY: usize = 512;

/// Outbound chat-completions payload for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// One chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

/// A typed piece of a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl CompletionRequest {
    /// A user turn carrying `instruction` followed by the base64 page image.
    pub fn for_page(model: &str, instruction: &str, image_b64: &str, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: instruction.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_uri(image_b64),
                        },
                    },
                ],
            }],
            max_tokens,
        }
    }
}

/// Undecoded answer from a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Anything that can answer a [`CompletionRequest`].
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Perform exactly one call. Only 2xx answers are returned as `Ok`.
    async fn complete(&self, request: &CompletionRequest) -> Result<RawResponse, TransportError>;
}

/// reqwest client for an OpenAI-style chat-completions endpoint.
pub struct HttpVisionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl fmt::Debug for HttpVisionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpVisionClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl HttpVisionClient {
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ExtractError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl VisionClient for HttpVisionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<RawResponse, TransportError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!("{} answered {} ({} bytes)", self.endpoint, status, body.len());

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\u{2026}", &s[..end])
}

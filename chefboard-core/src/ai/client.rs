//! The seam between the consolidator and whatever answers its prompts.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use super::config::ConfigError;
use super::types::{ChatRequest, ChatResponse};

#[derive(Error, Debug)]
pub enum AiError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Service returned error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AiError::RequestFailed(format!("timed out: {}", e))
        } else {
            AiError::RequestFailed(e.to_string())
        }
    }
}

/// Trait for AI clients.
///
/// Implementations make exactly one request per call and never retry.
#[async_trait]
pub trait AiClient: Send + Sync + fmt::Debug {
    /// Send a request and return the raw response body.
    ///
    /// `prompt_name` identifies the prompt in logs.
    async fn complete(&self, prompt_name: &str, request: ChatRequest)
        -> Result<ChatResponse, AiError>;

    /// Provider name, e.g. "endpoint", "gemini" or "fake".
    fn provider_name(&self) -> &'static str;
}

/// Cut a response body down to something that fits in a log line or error.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}…", &body[..end]),
        None => body.to_string(),
    }
}

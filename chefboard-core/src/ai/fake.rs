//! Fake AI client for testing and offline demos.
//!
//! Responses are scripted ahead of time, so tests run without network access.
//! Every call is recorded.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use super::client::{AiClient, AiError};
use super::types::{ChatRequest, ChatResponse};

type Handler = Box<dyn Fn(&ChatRequest) -> Result<String, AiError> + Send + Sync>;

/// A scripted AI client.
///
/// Queued responses are used first, in order. After that the handler answers,
/// if one is set; otherwise the call fails.
#[derive(Default)]
pub struct FakeAiClient {
    queue: Mutex<VecDeque<Result<String, String>>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl fmt::Debug for FakeAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeAiClient")
            .field("queued", &lock(&self.queue).len())
            .field("calls", &self.call_count())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FakeAiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that answers every call with the same body.
    pub fn with_response(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::with_handler(move |_| Ok(body.clone()))
    }

    /// A client that computes each answer from the request.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String, AiError> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::default()
        }
    }

    /// A client whose every call fails.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_handler(move |_| Err(AiError::RequestFailed(message.clone())))
    }

    /// Queue a body for the next unanswered call.
    pub fn push_response(&self, body: impl Into<String>) {
        lock(&self.queue).push_back(Ok(body.into()));
    }

    /// Queue a failure for the next unanswered call.
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.queue).push_back(Err(message.into()));
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl AiClient for FakeAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        lock(&self.requests).push(request.clone());
        tracing::debug!(prompt_name, "FakeAiClient answering");

        let queued = lock(&self.queue).pop_front();
        let body = match (queued, &self.handler) {
            (Some(Ok(body)), _) => body,
            (Some(Err(message)), _) => return Err(AiError::RequestFailed(message)),
            (None, Some(handler)) => handler(&request)?,
            (None, None) => {
                return Err(AiError::RequestFailed(format!(
                    "FakeAiClient: no response configured for {}",
                    prompt_name
                )))
            }
        };
        Ok(ChatResponse::new(body))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

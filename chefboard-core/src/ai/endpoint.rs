//! Client for the application's own consolidation route.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::client::{truncate_body, AiClient, AiError};
use super::types::{ChatRequest, ChatResponse};

/// Posts `{systemPrompt, prompt, responseMode}` to a fixed URL.
///
/// The route forwards to whatever model the application uses and answers in
/// one of the shapes [`extract_text`](super::response::extract_text) knows.
#[derive(Debug)]
pub struct EndpointClient {
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointRequest {
    system_prompt: String,
    prompt: String,
    response_mode: &'static str,
}

impl EndpointClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AiClient for EndpointClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        let payload = EndpointRequest {
            system_prompt: request.system_prompt(),
            prompt: request.user_prompt(),
            response_mode: if request.json_response { "json" } else { "text" },
        };

        tracing::debug!(prompt_name, url = %self.url, "Calling consolidation endpoint");

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AiError::Status {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        Ok(ChatResponse::new(body))
    }

    fn provider_name(&self) -> &'static str {
        "endpoint"
    }
}

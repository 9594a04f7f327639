//! AI configuration from environment variables.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::client::{AiClient, AiError};
use super::endpoint::EndpointClient;
use super::gemini::GeminiClient;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default number of recipes per consolidation request.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default pause between batches in milliseconds.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 500;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },
}

/// Which service answers consolidation prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    /// The application's own consolidation route.
    Endpoint,
    /// Gemini `generateContent`, called directly.
    Gemini,
    /// No service; lists are built locally.
    None,
}

/// AI client configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: AiProvider,
    /// URL of the consolidation route (endpoint provider).
    pub endpoint: Option<String>,
    /// Gemini API key (gemini provider).
    pub api_key: Option<String>,
    pub model: String,
    /// Recipes per request. Always at least 1.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub batch_delay_ms: u64,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::None,
            endpoint: None,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AiConfig {
    /// Load configuration from environment variables.
    ///
    /// - `CHEFBOARD_AI_PROVIDER`: "endpoint", "gemini" or "none". Defaults to
    ///   "endpoint" when `CHEFBOARD_AI_ENDPOINT` is set, else "none".
    /// - `CHEFBOARD_AI_ENDPOINT`: consolidation URL (required for endpoint)
    /// - `GEMINI_API_KEY`: API key (required for gemini)
    /// - `CHEFBOARD_AI_MODEL`: Gemini model (default: "gemini-2.0-flash")
    /// - `CHEFBOARD_AI_BATCH_SIZE`: recipes per request (default: 5)
    /// - `CHEFBOARD_AI_BATCH_DELAY_MS`: pause between batches (default: 500)
    /// - `CHEFBOARD_AI_TIMEOUT_SECS`: request timeout (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let endpoint = get("CHEFBOARD_AI_ENDPOINT");
        let api_key = get("GEMINI_API_KEY");

        let provider = match get("CHEFBOARD_AI_PROVIDER").as_deref().map(str::trim) {
            Some("endpoint") => AiProvider::Endpoint,
            Some("gemini") => AiProvider::Gemini,
            Some("none") => AiProvider::None,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "CHEFBOARD_AI_PROVIDER".to_string(),
                    value: other.to_string(),
                })
            }
            None if endpoint.is_some() => AiProvider::Endpoint,
            None => AiProvider::None,
        };

        match provider {
            AiProvider::Endpoint if endpoint.is_none() => {
                return Err(ConfigError::MissingEnvVar("CHEFBOARD_AI_ENDPOINT".to_string()))
            }
            AiProvider::Gemini if api_key.is_none() => {
                return Err(ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))
            }
            _ => {}
        }

        let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
            match get(var) {
                None => Ok(default),
                Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: var.to_string(),
                    value,
                }),
            }
        };

        let batch_size = parse_u64("CHEFBOARD_AI_BATCH_SIZE", DEFAULT_BATCH_SIZE as u64)?;
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                var: "CHEFBOARD_AI_BATCH_SIZE".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(Self {
            provider,
            endpoint,
            api_key,
            model: get("CHEFBOARD_AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            batch_size: batch_size as usize,
            batch_delay_ms: parse_u64("CHEFBOARD_AI_BATCH_DELAY_MS", DEFAULT_BATCH_DELAY_MS)?,
            timeout_secs: parse_u64("CHEFBOARD_AI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the configured client. `None` means no service is configured.
    pub fn create_client(&self) -> Result<Option<Arc<dyn AiClient>>, AiError> {
        match self.provider {
            AiProvider::None => Ok(None),
            AiProvider::Endpoint => {
                let url = self
                    .endpoint
                    .clone()
                    .ok_or_else(|| ConfigError::MissingEnvVar("CHEFBOARD_AI_ENDPOINT".to_string()))?;
                Ok(Some(Arc::new(EndpointClient::new(url, self.timeout())?)))
            }
            AiProvider::Gemini => {
                let api_key = self
                    .api_key
                    .clone()
                    .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;
                Ok(Some(Arc::new(GeminiClient::new(
                    api_key,
                    self.model.clone(),
                    self.timeout(),
                )?)))
            }
        }
    }
}

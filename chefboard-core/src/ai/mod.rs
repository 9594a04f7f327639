//! External consolidation client.
//!
//! This module provides:
//! - `AiClient` trait for abstracting the service that answers prompts
//! - `EndpointClient` for the application's consolidation route and
//!   `GeminiClient` for calling Gemini directly
//! - `FakeAiClient` with scripted responses for tests
//! - `Consolidator`, which batches recipes and merges the answers
//! - Configuration via environment variables
//!
//! # Configuration
//!
//! Set these environment variables:
//!
//! - `CHEFBOARD_AI_PROVIDER` (optional): "endpoint", "gemini" or "none"
//! - `CHEFBOARD_AI_ENDPOINT` (endpoint provider): consolidation URL
//! - `GEMINI_API_KEY` (gemini provider): API key
//! - `CHEFBOARD_AI_MODEL` (optional): Gemini model name
//! - `CHEFBOARD_AI_BATCH_SIZE` (optional): recipes per request
//! - `CHEFBOARD_AI_BATCH_DELAY_MS` (optional): delay between batches in ms
//! - `CHEFBOARD_AI_TIMEOUT_SECS` (optional): HTTP request timeout
//!
//! # Example
//!
//! ```ignore
//! use chefboard_core::ai::{AiConfig, ConsolidationMode, Consolidator};
//!
//! let config = AiConfig::from_env()?;
//! if let Some(client) = config.create_client()? {
//!     let consolidator = Consolidator::from_config(client, &config);
//!     let outcome = consolidator
//!         .consolidate(ConsolidationMode::PurchaseUnits, &recipes)
//!         .await;
//!     println!("{:?}", outcome.status);
//! }
//! ```

mod client;
mod config;
mod consolidate;
mod endpoint;
mod fake;
mod gemini;
pub mod prompts;
pub mod response;
mod types;

pub use client::{AiClient, AiError};
pub use config::{AiConfig, AiProvider, ConfigError};
pub use consolidate::{ConsolidationMode, ConsolidationOutcome, Consolidator, ParsedResult};
pub use endpoint::EndpointClient;
pub use fake::FakeAiClient;
pub use gemini::GeminiClient;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Role};

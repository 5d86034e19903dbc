// src/completion/mod.rs
//! Completion client abstraction: one prompt in, raw text out.
//! Endpoint, credentials and deployment are configuration; the pipeline only
//! sees the `CompletionClient` trait so tests can swap in `MockCompletion`.

pub mod azure;
pub mod mock;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CompletionConfig;

pub use azure::AzureOpenAiClient;
pub use mock::MockCompletion;
pub use retry::{complete_with_retry, BatchOutcome, RetryPolicy};

pub const RATE_LIMIT_STATUS: u16 = 429;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub deployment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionResponse {
    pub text: String,
}

/// Classified failure of a single completion attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("{status} {message}")]
    Api { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("completion attempt timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("could not decode completion response: {0}")]
    Decode(String),
    #[error("completion endpoint or API key is not configured")]
    MissingCredentials,
}

impl CompletionError {
    pub fn status(&self) -> Option<u16> {
        match self {
            CompletionError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(RATE_LIMIT_STATUS)
    }

    /// Human-readable text used in the per-item `Error: {message}` summary.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynCompletionClient = Arc<dyn CompletionClient>;

/// Build a client according to config and environment.
///
/// * `AI_TEST_MODE=mock` → deterministic mock that answers with one well-formed
///   marker section per `Feedback N:` line in the prompt.
/// * otherwise → Azure OpenAI client.
pub fn build_client(config: &CompletionConfig) -> anyhow::Result<DynCompletionClient> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        tracing::info!("AI_TEST_MODE=mock; using mock completion client");
        return Ok(Arc::new(MockCompletion::echo_markers()));
    }
    Ok(Arc::new(AzureOpenAiClient::new(config)?))
}

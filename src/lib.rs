// src/lib.rs
// Public library surface for the binary, the demo and integration tests.

pub mod api;
pub mod completion;
pub mod config;
pub mod feedback;
pub mod metrics;
pub mod present;
pub mod sources;

use std::sync::Arc;

use axum::Router;
use tracing::info;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::completion::{CompletionClient, DynCompletionClient, MockCompletion};
pub use crate::config::{CompletionConfig, SourcesConfig};
pub use crate::feedback::{
    CancelFlag, FeedbackItem, InsightRecord, PipelineError, PipelineSettings, Summarizer,
};

/// Full in-process app built from environment/config files.
///
/// With `AI_TEST_MODE=mock` the completion client is the deterministic mock,
/// so the router can be exercised without network access to the model.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = CompletionConfig::load_default()?;
    let sources_cfg = SourcesConfig::load_default()?;
    let client = completion::build_client(&cfg)?;
    app_with(client, &cfg, sources::build_sources(&sources_cfg))
}

/// Router with an explicit completion client and connector set.
pub fn app_with(
    client: DynCompletionClient,
    cfg: &CompletionConfig,
    sources: Vec<Box<dyn sources::FeedbackSource>>,
) -> anyhow::Result<Router> {
    // Safe diagnostics only: endpoint, deployment, key length.
    info!("completion cfg loaded: {}", cfg.describe());
    info!(
        provider = client.name(),
        sources = sources.len(),
        "building insights router"
    );

    let metrics = metrics::Metrics::init(cfg.batch_size, cfg.max_attempts)?;
    let state = AppState {
        summarizer: Summarizer::new(client, PipelineSettings::from(cfg)),
        sources: Arc::new(sources),
    };
    Ok(create_router(state).merge(metrics.router()))
}

// src/feedback/mod.rs
//! Feedback summarization pipeline: batch → prompt → completion (with retry)
//! → demultiplex → assemble.
//!
//! Batches run strictly one after another so the output order is the input
//! order and the completion endpoint never sees concurrent requests from one
//! invocation. A failing batch degrades its own summaries and the pipeline
//! moves on; only bad input shape, missing provenance and cancellation abort
//! the whole call.

pub mod assemble;
pub mod batch;
pub mod demux;
pub mod prompt;
pub mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::completion::{
    complete_with_retry, BatchOutcome, CompletionRequest, DynCompletionClient, RetryPolicy,
};
use crate::config::CompletionConfig;

pub use assemble::assemble;
pub use batch::{batches, DEFAULT_BATCH_SIZE};
pub use demux::{demultiplex, DemuxOutcome};
pub use prompt::build_prompt;
pub use types::{FeedbackItem, FeedbackMetadata, InsightRecord};

/// Fatal outcomes of a pipeline invocation. Per-batch completion failures are
/// not here: they degrade that batch's summaries instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("expected a sequence of feedback items but got {found}")]
    InputShape { found: String },
    #[error("feedback item {index} is missing required field `{field}`")]
    MissingProvenance { index: usize, field: &'static str },
    #[error("summarization cancelled after {completed_batches} batch(es)")]
    Cancelled { completed_batches: usize },
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("summarizer_runs_total", "Pipeline invocations.");
        describe_counter!("summarizer_batches_total", "Batches sent to the completion client.");
        describe_counter!("summarizer_items_total", "Feedback items summarized.");
        describe_counter!(
            "summarizer_batch_outcome_total",
            "Batch outcomes by label (completed / rate_limited / failed)."
        );
        describe_counter!(
            "summarizer_demux_fallback_total",
            "Completions whose marker count did not match the batch size."
        );
        describe_counter!("completion_attempts_total", "Completion attempts, including retries.");
        describe_counter!(
            "completion_rate_limited_total",
            "Completion attempts rejected with status 429."
        );
        describe_histogram!("summarizer_batch_ms", "Wall time per batch in milliseconds.");
    });
}

/// Dynamic input boundary (JSON bodies, connector payloads).
pub struct FeedbackInput;

impl FeedbackInput {
    /// Array → items, single object → one item, anything else → `InputShape`.
    pub fn from_value(value: Value) -> Result<Vec<FeedbackItem>, PipelineError> {
        match value {
            Value::Array(_) => serde_json::from_value(value).map_err(|e| {
                PipelineError::InputShape {
                    found: format!("an array with a malformed item ({e})"),
                }
            }),
            Value::Object(_) => serde_json::from_value::<FeedbackItem>(value)
                .map(|item| vec![item])
                .map_err(|e| PipelineError::InputShape {
                    found: format!("an object that is not a feedback item ({e})"),
                }),
            other => Err(PipelineError::InputShape {
                found: json_kind(&other).to_string(),
            }),
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Cooperative cancellation, checked before each batch starts.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub batch_size: usize,
    pub max_tokens: u32,
    pub deployment: String,
    pub retry: RetryPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_tokens: crate::config::DEFAULT_MAX_TOKENS,
            deployment: String::new(),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&CompletionConfig> for PipelineSettings {
    fn from(cfg: &CompletionConfig) -> Self {
        Self {
            batch_size: cfg.batch_size,
            max_tokens: cfg.max_tokens,
            deployment: cfg.deployment.clone(),
            retry: cfg.retry_policy(),
        }
    }
}

/// Pipeline entry point. Cheap to clone; the client is shared.
#[derive(Clone)]
pub struct Summarizer {
    client: DynCompletionClient,
    settings: PipelineSettings,
}

impl Summarizer {
    pub fn new(client: DynCompletionClient, settings: PipelineSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Summarize `items` into one insight record each, in input order.
    pub async fn summarize(
        &self,
        items: &[FeedbackItem],
        override_prompt: Option<&str>,
    ) -> Result<Vec<InsightRecord>, PipelineError> {
        self.summarize_with_cancel(items, override_prompt, &CancelFlag::new())
            .await
    }

    /// Validate a raw JSON payload, then summarize it.
    pub async fn summarize_value(
        &self,
        items: Value,
        override_prompt: Option<&str>,
    ) -> Result<Vec<InsightRecord>, PipelineError> {
        let items = FeedbackInput::from_value(items)?;
        self.summarize(&items, override_prompt).await
    }

    pub async fn summarize_with_cancel(
        &self,
        items: &[FeedbackItem],
        override_prompt: Option<&str>,
        cancel: &CancelFlag,
    ) -> Result<Vec<InsightRecord>, PipelineError> {
        ensure_metrics_described();
        counter!("summarizer_runs_total").increment(1);

        let mut results = Vec::with_capacity(items.len());
        let mut completed_batches = 0usize;

        for batch in batches(items, self.settings.batch_size) {
            if cancel.is_cancelled() {
                warn!(target: "summarizer", completed_batches, "cancelled before next batch");
                return Err(PipelineError::Cancelled { completed_batches });
            }

            let t0 = Instant::now();
            let outcome = self.run_batch(batch, override_prompt).await;
            let summaries = outcome.summaries(batch.len());
            results.extend(assemble(batch, summaries, results.len())?);

            completed_batches += 1;
            counter!("summarizer_batches_total").increment(1);
            counter!("summarizer_items_total").increment(batch.len() as u64);
            counter!("summarizer_batch_outcome_total", "outcome" => outcome.label()).increment(1);
            histogram!("summarizer_batch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

            info!(
                target: "summarizer",
                batch = completed_batches,
                size = batch.len(),
                outcome = outcome.label(),
                attempts = outcome.attempts(),
                "batch done"
            );
        }

        Ok(results)
    }

    async fn run_batch(&self, batch: &[FeedbackItem], override_prompt: Option<&str>) -> BatchOutcome {
        let request = CompletionRequest {
            prompt: build_prompt(batch, override_prompt),
            max_tokens: self.settings.max_tokens,
            deployment: self.settings.deployment.clone(),
        };
        complete_with_retry(self.client.as_ref(), &request, &self.settings.retry).await
    }
}

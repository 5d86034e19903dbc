// src/sources/mod.rs
//! Feedback connectors. Every connector returns a plain `Vec<FeedbackItem>`;
//! a failing connector is logged and skipped, never fatal.

pub mod github;
pub mod stackoverflow;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::config::SourcesConfig;
use crate::feedback::FeedbackItem;

pub use github::GitHubIssues;
pub use stackoverflow::StackOverflowQuestions;

pub const FALLBACK_SOURCE: &str = "Fallback";
pub const FALLBACK_CONTENT: &str =
    "Example feedback: The documentation for Teams AI is confusing.";
pub const FALLBACK_URL: &str = "https://example.com";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sources_items_total", "Feedback items fetched from connectors.");
        describe_counter!("sources_errors_total", "Connector fetch/parse errors.");
        describe_counter!(
            "sources_fallback_total",
            "Runs where no connector returned anything and the fallback item was used."
        );
        describe_gauge!("sources_last_run_ts", "Unix ts when connectors last ran.");
    });
}

#[async_trait::async_trait]
pub trait FeedbackSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<FeedbackItem>>;
    fn name(&self) -> &'static str;
}

pub fn fallback_item() -> FeedbackItem {
    FeedbackItem::text(FALLBACK_SOURCE, FALLBACK_CONTENT, FALLBACK_URL)
}

/// Fetch from every source in order and concatenate. If nothing came back,
/// return the single fallback item so downstream always has something to show.
pub async fn collect_feedback(sources: &[Box<dyn FeedbackSource>]) -> Vec<FeedbackItem> {
    ensure_metrics_described();

    let mut items = Vec::new();
    for s in sources {
        match s.fetch().await {
            Ok(mut v) => {
                counter!("sources_items_total", "source" => s.name()).increment(v.len() as u64);
                items.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = s.name(), "feedback source failed");
                counter!("sources_errors_total", "source" => s.name()).increment(1);
            }
        }
    }

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("sources_last_run_ts").set(now as f64);

    if items.is_empty() {
        counter!("sources_fallback_total").increment(1);
        items.push(fallback_item());
    }

    tracing::info!(target: "sources", count = items.len(), "collected feedback");
    items
}

/// Live HTTP connectors enabled in `cfg`.
pub fn build_sources(cfg: &SourcesConfig) -> Vec<Box<dyn FeedbackSource>> {
    let mut out: Vec<Box<dyn FeedbackSource>> = Vec::new();
    if cfg.github.enabled {
        out.push(Box::new(GitHubIssues::from_config(&cfg.github)));
    }
    if cfg.stackoverflow.enabled {
        out.push(Box::new(StackOverflowQuestions::from_config(
            &cfg.stackoverflow,
        )));
    }
    out
}

//! Demo that runs a handful of feedback items through the pipeline against the
//! deterministic mock completion client (no network).

use std::sync::Arc;

use dev_feedback_insights::completion::MockCompletion;
use dev_feedback_insights::feedback::{PipelineSettings, Summarizer};
use dev_feedback_insights::present::{interleave_by_source, DISPLAY_LIMIT, DISPLAY_SOURCES};
use dev_feedback_insights::FeedbackItem;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let items = vec![
        FeedbackItem::text(
            "GitHub",
            "Bot stops responding after token refresh\nRepro: leave it idle for an hour.",
            "https://github.com/microsoft/teams-ai/issues/1",
        ),
        FeedbackItem::text(
            "Stack Overflow",
            "How do I send an Adaptive Card from a proactive message?",
            "https://stackoverflow.com/q/1",
        ),
        FeedbackItem::text(
            "GitHub",
            "Docs for the AI planner are out of date",
            "https://github.com/microsoft/teams-ai/issues/2",
        ),
    ];

    let client = Arc::new(MockCompletion::echo_markers());
    let summarizer = Summarizer::new(client, PipelineSettings::default());
    let insights = summarizer.summarize(&items, None).await?;

    for r in interleave_by_source(&insights, &DISPLAY_SOURCES, DISPLAY_LIMIT) {
        println!("[{}] {}\n  {}", r.source, r.url, r.summary);
    }
    println!("summarize-demo done");
    Ok(())
}

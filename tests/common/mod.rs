// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dev_feedback_insights::completion::{MockCompletion, RetryPolicy};
use dev_feedback_insights::feedback::{FeedbackItem, PipelineSettings, Summarizer};

/// Items named `a`, `b`, ... with matching urls so order is easy to assert.
pub fn lettered_items(n: usize) -> Vec<FeedbackItem> {
    (0..n)
        .map(|i| {
            let letter = (b'a' + i as u8) as char;
            FeedbackItem::text(
                if i % 2 == 0 { "GitHub" } else { "Stack Overflow" },
                &format!("feedback {letter}"),
                &format!("https://example.com/{letter}"),
            )
        })
        .collect()
}

pub fn settings(batch_size: usize) -> PipelineSettings {
    PipelineSettings {
        batch_size,
        max_tokens: 4096,
        deployment: "test-deployment".into(),
        retry: RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(3_000),
            attempt_timeout: Duration::from_secs(60),
        },
    }
}

pub fn summarizer(mock: &Arc<MockCompletion>, batch_size: usize) -> Summarizer {
    Summarizer::new(mock.clone(), settings(batch_size))
}

/// Well-formed completion with one section per item.
pub fn marker_response(n: usize, tag: &str) -> String {
    (1..=n)
        .map(|i| format!("Pain Points {i}:\n- {tag} pain {i}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

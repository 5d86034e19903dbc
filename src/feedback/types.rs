// src/feedback/types.rs
use serde::{Deserialize, Serialize};

fn default_kind() -> String {
    "text".to_string()
}

/// One unit of raw developer feedback plus its provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackItem {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String, // e.g. "text"
    pub source: String, // "GitHub" | "Stack Overflow" | "Fallback"
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: FeedbackMetadata,
}

/// `url` stays optional at the JSON boundary; the assembler rejects items without one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackMetadata {
    #[serde(default)]
    pub url: Option<String>,
}

impl FeedbackItem {
    pub fn text(source: &str, content: &str, url: &str) -> Self {
        Self {
            kind: default_kind(),
            source: source.to_string(),
            content: content.to_string(),
            metadata: FeedbackMetadata {
                url: Some(url.to_string()),
            },
        }
    }
}

/// Per-item output: generated summary joined with the item's provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsightRecord {
    pub source: String,
    pub summary: String,
    pub url: String,
}

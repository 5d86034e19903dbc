// src/feedback/prompt.rs
//! Prompt rendering for one batch of feedback items.
//!
//! The default prompt ends with one `Pain Points {i}:` marker per item; the
//! demultiplexer splits the completion on exactly that marker text.

use std::fmt::Write as _;

use tracing::{debug, trace};

use super::types::FeedbackItem;

/// Instruction plus worked examples placed before the batch's feedback lines.
pub const DEFAULT_PREAMBLE: &str = "You are an expert AI assistant that extracts specific pain points from developer feedback. For each feedback, list the pain points as bullet points. Ignore compliments or general statements.

Example:
Feedback 1: \"The documentation is confusing and the setup process is slow.\"
Pain Points 1:
- Documentation is confusing
- Setup process is slow

Feedback 2: \"Great tool, but the error messages are unclear and support is slow.\"
Pain Points 2:
- Error messages are unclear
- Support is slow

Feedback 3: \"The UI is slow to load and the export feature is buggy.\"
Pain Points 3:
- UI is slow to load
- Export feature is buggy

";

/// Marker the model is expected to emit before each item's summary.
pub fn marker(index: usize) -> String {
    format!("Pain Points {index}:")
}

/// Build the prompt for `batch`.
///
/// A non-empty `override_prompt` is used verbatim as the whole prompt and the
/// batch content is not appended. The demultiplexer still expects the
/// `Pain Points {i}:` markers, so an override that does not ask for them ends
/// up in the whole-response fallback.
pub fn build_prompt(batch: &[FeedbackItem], override_prompt: Option<&str>) -> String {
    if let Some(custom) = override_prompt.filter(|p| !p.is_empty()) {
        debug!(
            target: "prompt",
            id = %prompt_id(custom),
            batch = batch.len(),
            "override prompt in use; batch content not attached"
        );
        return custom.to_string();
    }

    let mut out = String::with_capacity(DEFAULT_PREAMBLE.len() + batch.len() * 128);
    out.push_str(DEFAULT_PREAMBLE);

    let lines: Vec<String> = batch
        .iter()
        .enumerate()
        .map(|(idx, item)| format!("Feedback {}: \"{}\"", idx + 1, item.content))
        .collect();
    out.push_str(&lines.join("\n\n"));
    out.push('\n');

    let markers: Vec<String> = (1..=batch.len()).map(marker).collect();
    out.push_str(&markers.join("\n"));
    out.push('\n');

    debug!(
        target: "prompt",
        id = %prompt_id(&out),
        batch = batch.len(),
        len = out.len(),
        "prompt built"
    );
    trace!(target: "prompt", prompt = %out);
    out
}

/// Short stable id for log correlation (first 6 bytes of sha256, hex).
pub fn prompt_id(prompt: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(prompt.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

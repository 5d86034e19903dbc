// src/feedback/assemble.rs
use super::types::{FeedbackItem, InsightRecord};
use super::PipelineError;

/// Join a batch with its index-aligned summaries.
///
/// `offset` is the position of the batch's first item in the full input, so
/// errors point at the caller's index rather than the batch-local one.
pub fn assemble(
    batch: &[FeedbackItem],
    summaries: Vec<String>,
    offset: usize,
) -> Result<Vec<InsightRecord>, PipelineError> {
    debug_assert_eq!(batch.len(), summaries.len());

    batch
        .iter()
        .zip(summaries)
        .enumerate()
        .map(|(i, (item, summary))| {
            let index = offset + i;
            if item.source.trim().is_empty() {
                return Err(PipelineError::MissingProvenance {
                    index,
                    field: "source",
                });
            }
            let url = item
                .metadata
                .url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .ok_or(PipelineError::MissingProvenance {
                    index,
                    field: "metadata.url",
                })?;
            Ok(InsightRecord {
                source: item.source.clone(),
                summary,
                url: url.to_string(),
            })
        })
        .collect()
}

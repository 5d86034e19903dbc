// src/feedback/batch.rs
use super::types::FeedbackItem;

pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Split items into contiguous batches of `batch_size` (last one may be shorter).
/// A zero batch size is treated as 1.
pub fn batches(
    items: &[FeedbackItem],
    batch_size: usize,
) -> impl Iterator<Item = &[FeedbackItem]> + '_ {
    items.chunks(batch_size.max(1))
}

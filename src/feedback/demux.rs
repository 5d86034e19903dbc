// src/feedback/demux.rs
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

pub const NO_SUMMARY: &str = "No summary returned.";

static RE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Pain Points \d+:").expect("marker regex"));

/// How a completion was mapped back onto the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxOutcome {
    Parsed,
    /// Marker count did not match the batch; every item got the whole text.
    Fallback { found: usize },
}

/// Split a completion into exactly `expected` summaries. Never fails.
pub fn demultiplex(text: &str, expected: usize) -> Vec<String> {
    demultiplex_detailed(text, expected).0
}

pub fn demultiplex_detailed(text: &str, expected: usize) -> (Vec<String>, DemuxOutcome) {
    let text = text.trim();

    // Segment 0 is whatever precedes the first marker.
    let sections: Vec<String> = RE_MARKER
        .split(text)
        .skip(1)
        .map(|s| {
            let t = s.trim();
            if t.is_empty() {
                NO_SUMMARY.to_string()
            } else {
                t.to_string()
            }
        })
        .collect();

    if sections.len() == expected {
        return (sections, DemuxOutcome::Parsed);
    }

    let found = sections.len();
    warn!(
        target: "demux",
        expected,
        found,
        "marker count mismatch; using whole response for every item"
    );
    counter!("summarizer_demux_fallback_total").increment(1);
    (
        vec![text.to_string(); expected],
        DemuxOutcome::Fallback { found },
    )
}

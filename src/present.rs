// src/present.rs
//! Display ordering for the chat surface: group records by source and take
//! them round-robin so one busy source does not crowd out the others.

use crate::feedback::InsightRecord;

pub const DISPLAY_LIMIT: usize = 6;

/// Round-robin order used by the chat surface. The fallback label comes last
/// so it only shows when the connectors returned nothing.
pub const DISPLAY_SOURCES: [&str; 3] = ["GitHub", "Stack Overflow", "Fallback"];

/// Interleave records of the listed sources (in `order`), keeping each
/// source's records in their original relative order, and cap at `limit`.
/// Records whose source is not listed are dropped.
pub fn interleave_by_source(
    records: &[InsightRecord],
    order: &[&str],
    limit: usize,
) -> Vec<InsightRecord> {
    let groups: Vec<Vec<&InsightRecord>> = order
        .iter()
        .map(|src| records.iter().filter(|r| r.source == *src).collect())
        .collect();
    let longest = groups.iter().map(Vec::len).max().unwrap_or(0);

    let mut out = Vec::with_capacity(limit.min(records.len()));
    'rounds: for i in 0..longest {
        for g in &groups {
            if let Some(r) = g.get(i) {
                if out.len() == limit {
                    break 'rounds;
                }
                out.push((*r).clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(source: &str, n: usize) -> InsightRecord {
        InsightRecord {
            source: source.to_string(),
            summary: format!("{source} {n}"),
            url: format!("https://x/{n}"),
        }
    }

    #[test]
    fn alternates_sources_and_truncates() {
        let records = vec![
            rec("GitHub", 1),
            rec("GitHub", 2),
            rec("GitHub", 3),
            rec("GitHub", 4),
            rec("GitHub", 5),
            rec("Stack Overflow", 1),
            rec("Stack Overflow", 2),
        ];
        let out = interleave_by_source(&records, &DISPLAY_SOURCES, DISPLAY_LIMIT);
        let got: Vec<&str> = out.iter().map(|r| r.summary.as_str()).collect();
        assert_eq!(
            got,
            vec![
                "GitHub 1",
                "Stack Overflow 1",
                "GitHub 2",
                "Stack Overflow 2",
                "GitHub 3",
                "GitHub 4"
            ]
        );
    }

    #[test]
    fn unlisted_sources_are_dropped() {
        let records = vec![rec("Reddit", 1), rec("GitHub", 1)];
        let out = interleave_by_source(&records, &["GitHub", "Stack Overflow"], 6);
        assert_eq!(out, vec![rec("GitHub", 1)]);
    }

    #[test]
    fn fallback_shows_when_alone() {
        let out = interleave_by_source(&[rec("Fallback", 1)], &DISPLAY_SOURCES, DISPLAY_LIMIT);
        assert_eq!(out.len(), 1);
    }
}

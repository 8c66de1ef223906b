//! Row display ordering
//!
//! Folds every row's lifespans into one summary span and sorts the rows:
//! resolved rows first (earliest resolution day first), unresolved rows last
//! (earliest start first).

use crate::types::{Lifespan, Timestamp};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Summary of all lifespans of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpan {
    pub row_id: String,
    /// Earliest lifespan start
    pub start: Timestamp,
    /// Latest lifespan end, or `None` if any lifespan of the row is open
    pub end: Option<Timestamp>,
}

/// Computes the top-to-bottom row order
pub struct RowOrderer;

impl RowOrderer {
    /// Summarize lifespans per row, in first-seen row order
    pub fn summarize(lifespans: &[Lifespan]) -> Vec<RowSpan> {
        let mut spans: Vec<RowSpan> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for lifespan in lifespans {
            match positions.get(lifespan.row_id.as_str()) {
                Some(&idx) => {
                    let span = &mut spans[idx];
                    span.start = span.start.min(lifespan.start);
                    // Once open, always open.
                    span.end = match (span.end, lifespan.end) {
                        (Some(current), Some(end)) => Some(current.max(end)),
                        _ => None,
                    };
                }
                None => {
                    positions.insert(&lifespan.row_id, spans.len());
                    spans.push(RowSpan {
                        row_id: lifespan.row_id.clone(),
                        start: lifespan.start,
                        end: lifespan.end,
                    });
                }
            }
        }

        spans
    }

    /// Display comparator between two row summaries
    pub fn compare(a: &RowSpan, b: &RowSpan) -> Ordering {
        match (a.end, b.end) {
            (None, None) => a.start.cmp(&b.start),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(end_a), Some(end_b)) => end_a
                .date_naive()
                .cmp(&end_b.date_naive())
                .then_with(|| a.start.cmp(&b.start)),
        }
    }

    /// Row identifiers in display order
    pub fn order(lifespans: &[Lifespan]) -> Vec<String> {
        let mut spans = Self::summarize(lifespans);
        spans.sort_by(Self::compare);
        spans.into_iter().map(|span| span.row_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_timestamp;

    fn ts(raw: &str) -> Timestamp {
        parse_timestamp(raw).unwrap()
    }

    fn span(row: &str, start: &str, end: Option<&str>) -> Lifespan {
        Lifespan {
            row_id: row.to_string(),
            start: ts(start),
            state: "Open".to_string(),
            end: end.map(ts),
        }
    }

    #[test]
    fn test_summary_takes_extremes() {
        let spans = RowOrderer::summarize(&[
            span("a", "2024-01-05", Some("2024-01-06")),
            span("a", "2024-01-01", Some("2024-01-03")),
        ]);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, ts("2024-01-01"));
        assert_eq!(spans[0].end, Some(ts("2024-01-06")));
    }

    #[test]
    fn test_open_lifespan_makes_row_open() {
        let spans = RowOrderer::summarize(&[
            span("a", "2024-01-01", None),
            span("a", "2024-01-05", Some("2024-02-01")),
        ]);

        assert_eq!(spans[0].end, None);
    }

    #[test]
    fn test_open_rows_sort_last() {
        let order = RowOrderer::order(&[
            span("open-early", "2020-01-01", None),
            span("closed-late", "2024-06-01", Some("2024-12-31")),
            span("open-late", "2024-01-01", None),
            span("closed-early", "2024-01-01", Some("2024-02-01")),
        ]);

        assert_eq!(order, vec!["closed-early", "closed-late", "open-early", "open-late"]);
    }

    #[test]
    fn test_same_end_day_breaks_on_start() {
        let order = RowOrderer::order(&[
            span("b", "2024-01-03", Some("2024-01-10T08:00:00Z")),
            span("a", "2024-01-02", Some("2024-01-10T20:00:00Z")),
            span("c", "2024-01-01", Some("2024-01-11T00:00:00Z")),
        ]);

        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_full_ties_keep_first_seen_order() {
        let order = RowOrderer::order(&[
            span("second", "2024-01-01", Some("2024-01-02")),
            span("first", "2024-01-01", Some("2024-01-02")),
        ]);

        assert_eq!(order, vec!["second", "first"]);
    }
}

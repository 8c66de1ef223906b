//! Total order over timeline events
//!
//! Events are ordered by time. Events at the same instant are ordered by the
//! category of their `type` label (start-type events first, resolution-type
//! events last) and finally by row identifier.
//!
//! Note that the tie-break classifies the event *type*, while lifespan
//! construction classifies the event *state*.

use crate::config::StateSets;
use crate::types::{ProjectedEvent, Timestamp};
use std::cmp::Ordering;

/// Anything the sorter can order
pub trait TimelineEvent {
    /// When the event happened
    fn timestamp(&self) -> Timestamp;

    /// The event type label (used for the same-instant tie-break)
    fn event_type(&self) -> &str;

    /// Display row, if the event has been assigned to one
    fn row_id(&self) -> Option<&str>;
}

impl TimelineEvent for ProjectedEvent {
    fn timestamp(&self) -> Timestamp {
        self.time
    }

    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn row_id(&self) -> Option<&str> {
        Some(&self.row_id)
    }
}

/// Comparator for timeline events
#[derive(Debug, Clone, Copy)]
pub struct EventSorter<'a> {
    states: &'a StateSets,
}

impl<'a> EventSorter<'a> {
    pub fn new(states: &'a StateSets) -> Self {
        Self { states }
    }

    /// Compare two events: time, then type category, then row identifier
    pub fn compare<E: TimelineEvent>(&self, e1: &E, e2: &E) -> Ordering {
        e1.timestamp()
            .cmp(&e2.timestamp())
            .then_with(|| {
                self.category_rank(e1.event_type())
                    .cmp(&self.category_rank(e2.event_type()))
            })
            .then_with(|| compare_row_ids(e1.row_id(), e2.row_id()))
    }

    /// Stable sort of `events` in timeline order
    pub fn sort<E: TimelineEvent>(&self, events: &mut [E]) {
        events.sort_by(|a, b| self.compare(a, b));
    }

    /// Same-instant rank of a type label.
    ///
    /// A start-type event precedes any non-start event and a resolution-type
    /// event follows any non-resolution event. Labels in both sets sit between
    /// pure start labels and unclassified labels.
    fn category_rank(&self, event_type: &str) -> u8 {
        match (
            self.states.is_start(event_type),
            self.states.is_resolution(event_type),
        ) {
            (true, false) => 0,
            (true, true) => 1,
            (false, false) => 2,
            (false, true) => 3,
        }
    }
}

/// Alphabetical by row; events without a row go last
fn compare_row_ids(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[derive(Debug, Clone)]
    struct TestEvent {
        name: &'static str,
        secs: i64,
        event_type: &'static str,
        row: Option<&'static str>,
    }

    impl TimelineEvent for TestEvent {
        fn timestamp(&self) -> Timestamp {
            Utc.timestamp_opt(self.secs, 0).unwrap()
        }

        fn event_type(&self) -> &str {
            self.event_type
        }

        fn row_id(&self) -> Option<&str> {
            self.row
        }
    }

    fn ev(name: &'static str, secs: i64, event_type: &'static str, row: Option<&'static str>) -> TestEvent {
        TestEvent { name, secs, event_type, row }
    }

    fn states() -> StateSets {
        StateSets {
            start: vec!["Open".to_string()],
            intermediate: vec![],
            resolution: vec!["Closed".to_string()],
        }
    }

    fn sorted_names(mut events: Vec<TestEvent>) -> Vec<&'static str> {
        let states = states();
        EventSorter::new(&states).sort(&mut events);
        events.into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn test_time_dominates() {
        let names = sorted_names(vec![
            ev("late-open", 20, "Open", Some("a")),
            ev("early-close", 10, "Closed", Some("z")),
        ]);
        assert_eq!(names, vec!["early-close", "late-open"]);
    }

    #[test]
    fn test_start_precedes_and_resolution_follows_at_same_instant() {
        let names = sorted_names(vec![
            ev("close", 5, "Closed", Some("a")),
            ev("comment", 5, "Commented", Some("a")),
            ev("open", 5, "Open", Some("z")),
        ]);
        assert_eq!(names, vec!["open", "comment", "close"]);
    }

    #[test]
    fn test_row_tie_break_with_missing_rows_last() {
        let names = sorted_names(vec![
            ev("none", 5, "Commented", None),
            ev("b", 5, "Commented", Some("b")),
            ev("a", 5, "Commented", Some("a")),
        ]);
        assert_eq!(names, vec!["a", "b", "none"]);
    }

    #[test]
    fn test_unordered_ties_keep_input_order() {
        let names = sorted_names(vec![
            ev("first", 5, "Commented", None),
            ev("second", 5, "Labeled", None),
        ]);
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_label_in_both_sets() {
        let states = StateSets {
            start: vec!["Open".to_string(), "Flip".to_string()],
            intermediate: vec![],
            resolution: vec!["Closed".to_string(), "Flip".to_string()],
        };
        let mut events = vec![
            ev("close", 1, "Closed", Some("a")),
            ev("neither", 1, "Commented", Some("a")),
            ev("flip", 1, "Flip", Some("a")),
            ev("open", 1, "Open", Some("a")),
        ];
        EventSorter::new(&states).sort(&mut events);

        let names: Vec<_> = events.iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["open", "flip", "neither", "close"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let states = states();
        let sorter = EventSorter::new(&states);
        let mut events = vec![
            ev("c", 3, "Closed", Some("x")),
            ev("a", 1, "Open", Some("x")),
            ev("b", 3, "Commented", Some("x")),
        ];
        sorter.sort(&mut events);
        let once: Vec<_> = events.iter().map(|e| e.name).collect();
        sorter.sort(&mut events);
        let twice: Vec<_> = events.iter().map(|e| e.name).collect();

        assert_eq!(once, vec!["a", "b", "c"]);
        assert_eq!(once, twice);
    }
}

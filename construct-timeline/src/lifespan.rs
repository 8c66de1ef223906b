//! Lifespan construction
//!
//! A small state machine, run once per row over the row's classified events
//! in timeline order. It is either tracking an open interval (start time and
//! state) or skipping until the next start-labelled event.
//!
//! - The row opens only on a start label. If its first event is not one, the
//!   machine starts out skipping.
//! - Every event seen while an interval is open closes it and opens the next
//!   one in the event's state.
//! - A resolution label closes the interval and skips until the next start
//!   label. When the resolution is the row's last event it becomes the end
//!   time of the final interval.
//! - If an interval is still open after the last event, it is emitted with an
//!   open end.

use crate::config::StateSets;
use crate::sorter::EventSorter;
use crate::types::{strip_whitespace, Lifespan, ProjectedEvent, Timestamp};

#[derive(Debug, Clone, Copy)]
enum Cursor<'e> {
    Open { start: Timestamp, state: &'e str },
    Skipping,
}

impl<'e> Cursor<'e> {
    fn open_at(event: &'e ProjectedEvent) -> Self {
        Cursor::Open {
            start: event.time,
            state: event.state_label(),
        }
    }
}

/// Builds lifespans for a single row
pub struct LifespanBuilder<'a> {
    states: &'a StateSets,
}

impl<'a> LifespanBuilder<'a> {
    pub fn new(states: &'a StateSets) -> Self {
        Self { states }
    }

    /// Reconstruct the lifespans of `row_id` from its classified events.
    ///
    /// `events` may be in any order; they are sorted with `EventSorter` first.
    /// A resolution that is the row's last event only ends the open interval;
    /// no zero-length span in the resolution state follows it.
    pub fn build(&self, row_id: &str, events: &[ProjectedEvent]) -> Vec<Lifespan> {
        let mut ordered: Vec<&ProjectedEvent> = events.iter().collect();
        let sorter = EventSorter::new(self.states);
        ordered.sort_by(|a, b| sorter.compare(*a, *b));

        let Some((first, rest)) = ordered.split_first() else {
            return Vec::new();
        };

        let mut lifespans = Vec::new();
        let mut cursor = if self.is_start(first) {
            Cursor::open_at(first)
        } else {
            log::trace!("Row {} does not begin with a start state, skipping", row_id);
            Cursor::Skipping
        };
        let mut resolved_at = None;

        for (position, &event) in rest.iter().enumerate() {
            let is_last = position + 1 == rest.len();
            let resolves = self.is_resolution(event);

            cursor = match cursor {
                // The closing event of the row ends the final interval below.
                open @ Cursor::Open { .. } if is_last && resolves => open,
                Cursor::Open { start, state } => {
                    lifespans.push(Lifespan {
                        row_id: row_id.to_string(),
                        start,
                        state: state.to_string(),
                        end: Some(event.time),
                    });
                    Cursor::open_at(event)
                }
                Cursor::Skipping if self.is_start(event) => Cursor::open_at(event),
                Cursor::Skipping => Cursor::Skipping,
            };

            if resolves {
                if is_last {
                    resolved_at = Some(event.time);
                } else {
                    cursor = Cursor::Skipping;
                }
            }
        }

        if let Cursor::Open { start, state } = cursor {
            lifespans.push(Lifespan {
                row_id: row_id.to_string(),
                start,
                state: state.to_string(),
                end: resolved_at,
            });
        }

        lifespans
    }

    fn is_start(&self, event: &ProjectedEvent) -> bool {
        self.states.is_start(&strip_whitespace(event.state_label()))
    }

    fn is_resolution(&self, event: &ProjectedEvent) -> bool {
        self.states.is_resolution(&strip_whitespace(event.state_label()))
    }
}

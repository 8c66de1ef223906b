//! Event projection
//!
//! Turns raw events into per-row projected events. Each retained event is
//! copied once for every construct it references; references to unknown
//! constructs are dropped for that target only. While walking the events the
//! projector also collects the vocabularies (state labels, types), the overall
//! time span and, per row, the events whose state is classified.

use crate::config::ProcessorConfig;
use crate::indexer::ConstructIndex;
use crate::sorter::EventSorter;
use crate::time::parse_timestamp;
use crate::types::{ProjectedEvent, RawEvent, Result, TimelineError, Timestamp};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Classified events grouped by row, in first-seen row order
#[derive(Debug, Clone, Default)]
pub struct RowEvents {
    order: Vec<String>,
    events: HashMap<String, Vec<ProjectedEvent>>,
}

impl RowEvents {
    /// Make sure `row_id` has a (possibly empty) bucket
    fn touch(&mut self, row_id: &str) -> &mut Vec<ProjectedEvent> {
        if !self.events.contains_key(row_id) {
            self.order.push(row_id.to_string());
        }
        self.events.entry(row_id.to_string()).or_default()
    }

    /// Classified events of one row, in input order
    pub fn get(&self, row_id: &str) -> Option<&[ProjectedEvent]> {
        self.events.get(row_id).map(Vec::as_slice)
    }

    /// Rows with their classified events, in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ProjectedEvent])> {
        self.order
            .iter()
            .map(move |row| (row.as_str(), self.events[row].as_slice()))
    }

    /// Number of rows that received at least one projected event
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Counters gathered during projection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionStats {
    pub duplicate_events: usize,
    pub null_references: usize,
    pub dangling_references: usize,
    pub invalid_timestamps: usize,
    pub category_events: usize,
}

/// Output of `EventProjector::project`
#[derive(Debug, Clone, Default)]
pub struct Projection {
    /// Projected events in timeline order
    pub events: Vec<ProjectedEvent>,
    /// Classified events per row (input for lifespan construction)
    pub row_events: RowEvents,
    /// Earliest and latest time of all retained events
    pub bounds: Option<(Timestamp, Timestamp)>,
    /// Sorted, deduplicated state labels
    pub statechanges: Vec<String>,
    /// Sorted, deduplicated event types
    pub types: Vec<String>,
    pub stats: ProjectionStats,
}

/// Projects raw events onto indexed constructs
pub struct EventProjector<'a> {
    config: &'a ProcessorConfig,
}

impl<'a> EventProjector<'a> {
    pub fn new(config: &'a ProcessorConfig) -> Self {
        Self { config }
    }

    /// Project `events` onto the rows of `index`
    ///
    /// Fails on the first unparseable event time unless the configuration
    /// asks for such events to be skipped.
    pub fn project(&self, events: &[RawEvent], index: &ConstructIndex) -> Result<Projection> {
        let states = &self.config.states;
        let mut projection = Projection::default();
        let mut seen_ids = HashSet::new();
        let mut statechanges = BTreeSet::new();
        let mut types = BTreeSet::new();

        for event in events {
            if !seen_ids.insert(event.id.as_str()) {
                log::trace!("Ignoring duplicate event {}", event.id);
                projection.stats.duplicate_events += 1;
                continue;
            }

            let Some(time) = parse_timestamp(&event.time) else {
                if self.config.skip_invalid_timestamps {
                    log::warn!("Skipping event {} with invalid time {:?}", event.id, event.time);
                    projection.stats.invalid_timestamps += 1;
                    continue;
                }
                return Err(TimelineError::InvalidTimestamp {
                    event_id: event.id.clone(),
                    value: event.time.clone(),
                });
            };

            projection.bounds = Some(match projection.bounds {
                Some((min, max)) => (min.min(time), max.max(time)),
                None => (time, time),
            });
            if let Some(state) = &event.state {
                statechanges.insert(state.clone());
            }
            types.insert(event.event_type.clone());

            let tracked = event
                .stripped_state()
                .is_some_and(|label| states.is_tracked(&label));

            let mut targets = HashSet::new();
            for reference in &event.related_constructs {
                let Some(construct_id) = reference else {
                    projection.stats.null_references += 1;
                    continue;
                };
                if !targets.insert(construct_id.as_str()) {
                    continue;
                }
                let Some(row_id) = index.row_id(construct_id) else {
                    log::trace!(
                        "Event {} references unknown construct {}",
                        event.id,
                        construct_id
                    );
                    projection.stats.dangling_references += 1;
                    continue;
                };

                let projected = ProjectedEvent::project(event, time, row_id);
                let bucket = projection.row_events.touch(row_id);
                if tracked {
                    bucket.push(projected.clone());
                    projection.stats.category_events += 1;
                }
                projection.events.push(projected);
            }
        }

        EventSorter::new(states).sort(&mut projection.events);
        projection.statechanges = statechanges.into_iter().collect();
        projection.types = types.into_iter().collect();

        log::debug!(
            "Projected {} events onto {} rows ({} duplicates, {} dangling references)",
            projection.events.len(),
            projection.row_events.len(),
            projection.stats.duplicate_events,
            projection.stats.dangling_references
        );

        Ok(projection)
    }
}

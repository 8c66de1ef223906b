//! Main processor API
//!
//! `TimelineProcessor` composes the indexing, projection, lifespan and row
//! ordering stages into one `ProcessedDataset`. It holds nothing but its
//! configuration, so one processor can be shared across threads and every
//! call to `process` is independent.

use crate::config::ProcessorConfig;
use crate::indexer::ConstructIndexer;
use crate::lifespan::LifespanBuilder;
use crate::projector::EventProjector;
use crate::rows::RowOrderer;
use crate::types::{
    ProcessedDataset, ProcessingReport, RawConstruct, RawEvent, Result, TimeFrame,
};
use std::collections::HashSet;

/// The timeline processor - entry point for building datasets
#[derive(Debug, Clone)]
pub struct TimelineProcessor {
    config: ProcessorConfig,
}

impl TimelineProcessor {
    /// Create a processor, validating the configuration
    ///
    /// # Example
    /// ```
    /// use construct_timeline::{ProcessorConfig, TimelineProcessor};
    ///
    /// let config = ProcessorConfig::new()
    ///     .add_start_state("Open")
    ///     .add_resolution_state("Closed");
    /// let processor = TimelineProcessor::new(config).unwrap();
    /// assert_eq!(processor.config().row_id_path, "_id");
    /// ```
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Build the timeline dataset for `constructs` and `events`
    ///
    /// # Returns
    /// * `Err(TimelineError::InvalidTimestamp)` if an event time cannot be
    ///   parsed and invalid timestamps are not being skipped
    pub fn process(&self, constructs: &[RawConstruct], events: &[RawEvent]) -> Result<ProcessedDataset> {
        log::info!(
            "Processing {} constructs and {} events",
            constructs.len(),
            events.len()
        );

        let index = ConstructIndexer::new(&self.config).index(constructs);
        let projection = EventProjector::new(&self.config).project(events, &index)?;

        let builder = LifespanBuilder::new(&self.config.states);
        let lifespans: Vec<_> = projection
            .row_events
            .iter()
            .filter(|(_, row_events)| !row_events.is_empty())
            .flat_map(|(row_id, row_events)| builder.build(row_id, row_events))
            .collect();
        log::debug!("Built {} lifespans", lifespans.len());

        let timeframe = projection
            .bounds
            .map(|(min, max)| TimeFrame::padded(min, max));
        let ids = RowOrderer::order(&lifespans);

        let report = ProcessingReport {
            duplicate_constructs: index.duplicates,
            duplicate_events: projection.stats.duplicate_events,
            unresolved_constructs: index.unresolved,
            null_references: projection.stats.null_references,
            dangling_references: projection.stats.dangling_references,
            invalid_timestamps: projection.stats.invalid_timestamps,
            projected_events: projection.events.len(),
            category_events: projection.stats.category_events,
        };

        let displayed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut longest_id = String::new();
        let mut longest_type = String::new();
        let mut constructs = Vec::new();
        for construct in index.into_constructs() {
            if !displayed.contains(construct.row_id.as_str()) {
                continue;
            }
            if construct.row_id.chars().count() > longest_id.chars().count() {
                longest_id = construct.row_id.clone();
            }
            let construct_type = &construct.construct.construct_type;
            if construct_type.chars().count() > longest_type.chars().count() {
                longest_type = construct_type.clone();
            }
            constructs.push(construct);
        }

        log::info!(
            "Dataset ready: {} rows, {} lifespans, {} events",
            ids.len(),
            lifespans.len(),
            projection.events.len()
        );

        Ok(ProcessedDataset {
            events: projection.events,
            lifespans,
            timeframe,
            statechanges: projection.statechanges,
            types: projection.types,
            ids,
            constructs,
            longest_type,
            longest_id,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimelineError;
    use serde_json::json;

    #[test]
    fn test_rejects_invalid_config() {
        let result = TimelineProcessor::new(ProcessorConfig::new().with_row_id_path("a..b"));
        assert!(matches!(result, Err(TimelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_input() {
        let processor = TimelineProcessor::new(ProcessorConfig::new()).unwrap();
        let dataset = processor.process(&[], &[]).unwrap();

        assert!(dataset.events.is_empty());
        assert!(dataset.lifespans.is_empty());
        assert!(dataset.ids.is_empty());
        assert!(dataset.timeframe.is_none());
        assert_eq!(dataset.longest_id, "");
        assert_eq!(dataset.report, ProcessingReport::default());
    }

    #[test]
    fn test_longest_labels_and_filtering() {
        let config = ProcessorConfig::new().add_start_state("Open");
        let processor = TimelineProcessor::new(config).unwrap();
        let constructs: Vec<RawConstruct> = serde_json::from_value(json!([
            {"_id": "short", "type": "bug"},
            {"_id": "much-longer", "type": "task"},
            {"_id": "silent", "type": "a-very-long-type"}
        ]))
        .unwrap();
        let events: Vec<RawEvent> = serde_json::from_value(json!([
            {"_id": "e1", "time": "2024-01-01", "type": "Opened", "state": "Open",
             "related_constructs": ["short", "much-longer"]},
            {"_id": "e2", "time": "2024-01-02", "type": "Commented",
             "related_constructs": ["silent"]}
        ]))
        .unwrap();

        let dataset = processor.process(&constructs, &events).unwrap();

        let kept: Vec<_> = dataset.constructs.iter().map(|c| c.row_id.as_str()).collect();
        assert_eq!(kept, vec!["short", "much-longer"]);
        assert_eq!(dataset.longest_id, "much-longer");
        assert_eq!(dataset.longest_type, "task");
        assert_eq!(dataset.events.len(), 3);
    }
}

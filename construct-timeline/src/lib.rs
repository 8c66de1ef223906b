//! Construct Timeline Library
//!
//! A pure, synchronous library that turns a raw stream of timestamped
//! state-change events about tracked entities ("constructs") into a timeline
//! dataset: per-row lifespans (how long each construct spent in each state)
//! plus a deterministic top-to-bottom row order, ready for a duration/Gantt
//! style chart.
//!
//! # Architecture
//!
//! The dataset is built by a fixed pipeline of stages:
//! - `indexer` - deduplicates constructs and resolves each one's display row
//! - `projector` - deduplicates events and fans them out onto rows
//! - `sorter` - the total order over events every stage relies on
//! - `lifespan` - per-row state machine producing lifespans
//! - `rows` - folds lifespans per row and orders the rows
//! - `processor` - composes the stages into one `ProcessedDataset`
//!
//! The library does NOT:
//! - Fetch or persist data
//! - Render charts
//! - Filter by time frame or origin
//!
//! # Example Usage
//!
//! ```
//! use construct_timeline::{ProcessorConfig, RawConstruct, RawEvent, TimelineProcessor};
//!
//! let config = ProcessorConfig::new()
//!     .add_start_state("Open")
//!     .add_resolution_state("Closed");
//! let processor = TimelineProcessor::new(config).unwrap();
//!
//! let constructs = vec![RawConstruct::new("issue-1", "bug")];
//! let events = vec![
//!     RawEvent::new("e1", "2024-01-01T09:00:00Z", "Opened")
//!         .with_state("Open")
//!         .with_related("issue-1"),
//!     RawEvent::new("e2", "2024-01-05T17:00:00Z", "Closed")
//!         .with_state("Closed")
//!         .with_related("issue-1"),
//! ];
//!
//! let dataset = processor.process(&constructs, &events).unwrap();
//! assert_eq!(dataset.ids, vec!["issue-1"]);
//! assert_eq!(dataset.lifespans.len(), 1);
//! assert!(!dataset.lifespans[0].is_open());
//! ```

// Public modules
pub mod config;
pub mod indexer;
pub mod lifespan;
pub mod processor;
pub mod projector;
pub mod rows;
pub mod sorter;
pub mod time;
pub mod types;

// Re-export main types for convenience
pub use config::{ProcessorConfig, StateSets};
pub use indexer::{Anonymizer, ConstructIndex, ConstructIndexer};
pub use lifespan::LifespanBuilder;
pub use processor::TimelineProcessor;
pub use projector::{EventProjector, Projection, ProjectionStats, RowEvents};
pub use rows::{RowOrderer, RowSpan};
pub use sorter::{EventSorter, TimelineEvent};
pub use types::{
    IndexedConstruct, Lifespan, ProcessedDataset, ProcessingReport, ProjectedEvent, RawConstruct,
    RawEvent, Result, StateLabel, TimeFrame, TimelineError, Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure we can create a processor with defaults
        let processor = TimelineProcessor::new(ProcessorConfig::default()).unwrap();
        let dataset = processor.process(&[], &[]).unwrap();
        assert!(dataset.ids.is_empty());
    }
}

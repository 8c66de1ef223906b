//! Processor configuration types
//!
//! The configuration is built once (builder methods or serde) and handed to
//! `TimelineProcessor::new`, which validates it and never mutates it again.
//! Every configuration value owns its state label sets.

use crate::types::{Result, TimelineError};
use serde::{Deserialize, Serialize};

/// Classification of whitespace-stripped state labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSets {
    /// Labels that open a lifespan
    #[serde(default)]
    pub start: Vec<String>,
    /// Labels that continue a lifespan in a new state
    #[serde(default)]
    pub intermediate: Vec<String>,
    /// Labels that close a lifespan
    #[serde(default)]
    pub resolution: Vec<String>,
}

impl StateSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_start(&self, label: &str) -> bool {
        self.start.iter().any(|s| s == label)
    }

    pub fn is_intermediate(&self, label: &str) -> bool {
        self.intermediate.iter().any(|s| s == label)
    }

    pub fn is_resolution(&self, label: &str) -> bool {
        self.resolution.iter().any(|s| s == label)
    }

    /// True if the label belongs to any of the three categories
    pub fn is_tracked(&self, label: &str) -> bool {
        self.is_start(label) || self.is_intermediate(label) || self.is_resolution(label)
    }
}

/// Configuration for the timeline processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Dotted path resolved per construct to derive its row identifier
    #[serde(default = "default_row_id_path")]
    pub row_id_path: String,

    /// Resolve the path against the first origin record instead of the construct
    #[serde(default)]
    pub row_id_from_origin: bool,

    /// Replace resolved identifiers with sequential labels
    #[serde(default)]
    pub anonymize: bool,

    /// Prefix for anonymized labels
    #[serde(default)]
    pub label_prefix: String,

    /// State label classification
    #[serde(default)]
    pub states: StateSets,

    /// Drop events with unparseable times instead of failing
    #[serde(default)]
    pub skip_invalid_timestamps: bool,
}

fn default_row_id_path() -> String {
    "_id".to_string()
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            row_id_path: default_row_id_path(),
            row_id_from_origin: false,
            anonymize: false,
            label_prefix: String::new(),
            states: StateSets::default(),
            skip_invalid_timestamps: false,
        }
    }
}

impl ProcessorConfig {
    /// Create a new processor configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the dotted row-identifier path
    pub fn with_row_id_path(mut self, path: impl Into<String>) -> Self {
        self.row_id_path = path.into();
        self
    }

    /// Builder method: resolve row identifiers from the first origin record
    pub fn with_origin_row_ids(mut self, enabled: bool) -> Self {
        self.row_id_from_origin = enabled;
        self
    }

    /// Builder method: enable anonymized row labels with the given prefix
    pub fn with_anonymization(mut self, prefix: impl Into<String>) -> Self {
        self.anonymize = true;
        self.label_prefix = prefix.into();
        self
    }

    /// Builder method: replace all state sets
    pub fn with_states(mut self, states: StateSets) -> Self {
        self.states = states;
        self
    }

    /// Builder method: add a start label
    pub fn add_start_state(mut self, label: impl Into<String>) -> Self {
        self.states.start.push(label.into());
        self
    }

    /// Builder method: add an intermediate label
    pub fn add_intermediate_state(mut self, label: impl Into<String>) -> Self {
        self.states.intermediate.push(label.into());
        self
    }

    /// Builder method: add a resolution label
    pub fn add_resolution_state(mut self, label: impl Into<String>) -> Self {
        self.states.resolution.push(label.into());
        self
    }

    /// Builder method: drop events with invalid times instead of failing
    pub fn with_skip_invalid_timestamps(mut self, enabled: bool) -> Self {
        self.skip_invalid_timestamps = enabled;
        self
    }

    /// The row-identifier path split on `.`
    pub fn row_id_segments(&self) -> Vec<String> {
        self.row_id_path.split('.').map(str::to_string).collect()
    }

    /// Check that the configuration can be used
    pub fn validate(&self) -> Result<()> {
        if self.row_id_path.trim().is_empty() {
            return Err(TimelineError::InvalidConfig(
                "row identifier path is empty".to_string(),
            ));
        }
        if self.row_id_path.split('.').any(|segment| segment.is_empty()) {
            return Err(TimelineError::InvalidConfig(format!(
                "row identifier path {:?} contains an empty segment",
                self.row_id_path
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_config_builder() {
        let config = ProcessorConfig::new()
            .with_row_id_path("source_id")
            .with_origin_row_ids(true)
            .with_anonymization("Issue ")
            .add_start_state("Open")
            .add_intermediate_state("InProgress")
            .add_resolution_state("Closed")
            .with_skip_invalid_timestamps(true);

        assert_eq!(config.row_id_segments(), vec!["source_id"]);
        assert!(config.row_id_from_origin);
        assert!(config.anonymize);
        assert_eq!(config.label_prefix, "Issue ");
        assert!(config.states.is_start("Open"));
        assert!(config.states.is_tracked("InProgress"));
        assert!(config.states.is_resolution("Closed"));
        assert!(config.skip_invalid_timestamps);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::new();

        assert_eq!(config.row_id_path, "_id");
        assert!(!config.row_id_from_origin);
        assert!(!config.anonymize);
        assert_eq!(config.label_prefix, "");
        assert_eq!(config.states, StateSets::default());
        assert!(!config.states.is_tracked("Open"));
    }

    #[test]
    fn test_serde_defaults_match_builder_defaults() {
        let config: ProcessorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProcessorConfig::default());
    }

    #[test]
    fn test_state_sets_are_not_shared() {
        let base = ProcessorConfig::new();
        let extended = base.clone().add_start_state("Open");

        assert!(base.states.start.is_empty());
        assert_eq!(extended.states.start, vec!["Open"]);
    }

    #[test]
    fn test_validate_rejects_bad_paths() {
        assert!(ProcessorConfig::new().with_row_id_path("").validate().is_err());
        assert!(ProcessorConfig::new().with_row_id_path("data..key").validate().is_err());
        assert!(ProcessorConfig::new().with_row_id_path("data.").validate().is_err());
        assert!(ProcessorConfig::new().with_row_id_path("data.key").validate().is_ok());
    }
}

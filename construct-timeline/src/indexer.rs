//! Construct indexing
//!
//! Deduplicates constructs, resolves each construct's row identifier through
//! the configured dotted path and tags the construct with its display row.
//! The result is the lookup table used to project events onto rows.

use crate::config::ProcessorConfig;
use crate::types::{IndexedConstruct, RawConstruct};
use std::collections::{HashMap, HashSet};

/// Sequential label allocator for anonymized row identifiers
///
/// Every newly seen identifier gets `prefix + counter` (counter starting at
/// 1); an identifier seen again gets its earlier label back.
#[derive(Debug, Clone)]
pub struct Anonymizer {
    prefix: String,
    next_counter: usize,
    seen: HashMap<String, String>,
}

impl Anonymizer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_counter: 1,
            seen: HashMap::new(),
        }
    }

    /// Label for `key`, allocating the next one if the key is new
    pub fn label_for(&mut self, key: &str) -> String {
        if let Some(label) = self.seen.get(key) {
            return label.clone();
        }
        let label = format!("{}{}", self.prefix, self.next_counter);
        self.next_counter += 1;
        self.seen.insert(key.to_string(), label.clone());
        label
    }

    /// Number of distinct identifiers labelled so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Indexed constructs plus the lookup by original construct identifier
#[derive(Debug, Clone, Default)]
pub struct ConstructIndex {
    constructs: Vec<IndexedConstruct>,
    lookup: HashMap<String, usize>,
    /// Constructs skipped because their identifier was already indexed
    pub duplicates: usize,
    /// Constructs skipped because their row identifier did not resolve
    pub unresolved: usize,
}

impl ConstructIndex {
    /// Find an indexed construct by its original identifier
    pub fn get(&self, construct_id: &str) -> Option<&IndexedConstruct> {
        self.lookup.get(construct_id).map(|&idx| &self.constructs[idx])
    }

    /// Row identifier of the construct with the given original identifier
    pub fn row_id(&self, construct_id: &str) -> Option<&str> {
        self.get(construct_id).map(|c| c.row_id.as_str())
    }

    /// Indexed constructs in input order
    pub fn constructs(&self) -> &[IndexedConstruct] {
        &self.constructs
    }

    pub fn into_constructs(self) -> Vec<IndexedConstruct> {
        self.constructs
    }

    pub fn len(&self) -> usize {
        self.constructs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructs.is_empty()
    }
}

/// Builds a `ConstructIndex` from raw constructs
pub struct ConstructIndexer<'a> {
    config: &'a ProcessorConfig,
    path: Vec<String>,
}

impl<'a> ConstructIndexer<'a> {
    pub fn new(config: &'a ProcessorConfig) -> Self {
        Self {
            config,
            path: config.row_id_segments(),
        }
    }

    /// Index `constructs`, keeping the first occurrence of every identifier
    pub fn index(&self, constructs: &[RawConstruct]) -> ConstructIndex {
        let mut index = ConstructIndex::default();
        let mut seen_ids = HashSet::new();
        // Labels are allocated even when anonymization is off so that the
        // numbering does not depend on the flag.
        let mut anonymizer = Anonymizer::new(self.config.label_prefix.clone());

        for construct in constructs {
            if !seen_ids.insert(construct.id.as_str()) {
                log::trace!("Ignoring duplicate construct {}", construct.id);
                index.duplicates += 1;
                continue;
            }

            let Some(key) = construct.resolve_key(&self.path, self.config.row_id_from_origin) else {
                log::debug!(
                    "Construct {} has no value at row identifier path {:?}",
                    construct.id,
                    self.config.row_id_path
                );
                index.unresolved += 1;
                continue;
            };

            let label = anonymizer.label_for(&key);
            let row_id = if self.config.anonymize { label } else { key };

            index.lookup.insert(construct.id.clone(), index.constructs.len());
            index.constructs.push(IndexedConstruct {
                construct: construct.clone(),
                row_id,
            });
        }

        log::debug!(
            "Indexed {} constructs onto {} rows ({} duplicates, {} unresolved)",
            index.constructs.len(),
            anonymizer.len(),
            index.duplicates,
            index.unresolved
        );

        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constructs(value: serde_json::Value) -> Vec<RawConstruct> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_anonymizer_reuses_labels() {
        let mut anonymizer = Anonymizer::new("U");

        assert_eq!(anonymizer.label_for("X"), "U1");
        assert_eq!(anonymizer.label_for("Y"), "U2");
        assert_eq!(anonymizer.label_for("Z"), "U3");
        assert_eq!(anonymizer.label_for("X"), "U1");
        assert_eq!(anonymizer.len(), 3);
    }

    #[test]
    fn test_index_by_id_with_duplicates() {
        let config = ProcessorConfig::new();
        let index = ConstructIndexer::new(&config).index(&constructs(json!([
            {"_id": "a", "type": "issue", "title": "first"},
            {"_id": "b", "type": "issue"},
            {"_id": "a", "type": "issue", "title": "second"}
        ])));

        assert_eq!(index.len(), 2);
        assert_eq!(index.duplicates, 1);
        assert_eq!(index.row_id("a"), Some("a"));
        assert_eq!(
            index.get("a").unwrap().construct.extra.get("title"),
            Some(&json!("first"))
        );
        let order: Vec<_> = index.constructs().iter().map(|c| c.construct.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_anonymized_rows() {
        let config = ProcessorConfig::new()
            .with_row_id_path("key")
            .with_anonymization("U");
        let index = ConstructIndexer::new(&config).index(&constructs(json!([
            {"_id": "1", "key": "X"},
            {"_id": "2", "key": "Y"},
            {"_id": "3", "key": "Z"},
            {"_id": "4", "key": "X"}
        ])));

        let rows: Vec<_> = index.constructs().iter().map(|c| c.row_id.as_str()).collect();
        assert_eq!(rows, vec!["U1", "U2", "U3", "U1"]);
    }

    #[test]
    fn test_rows_from_origin() {
        let config = ProcessorConfig::new()
            .with_row_id_path("source_id")
            .with_origin_row_ids(true);
        let index = ConstructIndexer::new(&config).index(&constructs(json!([
            {"_id": "1", "origin_id": [{"source_id": "gh-1"}, {"source_id": "ignored"}]},
            {"_id": "2", "origin_id": []}
        ])));

        assert_eq!(index.row_id("1"), Some("gh-1"));
        assert_eq!(index.row_id("2"), None);
        assert_eq!(index.unresolved, 1);
    }

    #[test]
    fn test_unresolved_constructs_do_not_consume_labels() {
        let config = ProcessorConfig::new()
            .with_row_id_path("data.key")
            .with_anonymization("R");
        let index = ConstructIndexer::new(&config).index(&constructs(json!([
            {"_id": "1"},
            {"_id": "2", "data": {"key": "K"}}
        ])));

        assert_eq!(index.row_id("2"), Some("R1"));
        assert_eq!(index.unresolved, 1);
    }
}

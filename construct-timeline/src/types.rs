//! Core types for the construct timeline library
//!
//! This module defines the raw records the processor consumes (constructs and
//! events), the intermediate projected events, and the dataset it emits. Raw
//! records are normalized once at deserialization time: identifiers become
//! strings, "no state" markers become `None`, and unknown fields are kept in an
//! explicit `extra` map instead of being copied blindly.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Timestamp type used throughout the processor
pub type Timestamp = DateTime<Utc>;

/// Result type for processor operations
pub type Result<T> = std::result::Result<T, TimelineError>;

/// State label of an event. `None` means the event carries no state change.
pub type StateLabel = Option<String>;

/// Errors that can occur while building a timeline dataset
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Invalid timestamp {value:?} on event {event_id}")]
    InvalidTimestamp { event_id: String, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Remove every whitespace character from a state label.
///
/// State classification compares labels with all whitespace removed, so
/// `"In Progress"` and `"InProgress"` are the same label.
pub fn strip_whitespace(label: &str) -> String {
    label.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalize a JSON value used as a record key into a string.
///
/// Strings are taken as-is, numbers use their decimal form and Mongo-style
/// `{"$oid": "..."}` objects collapse to the inner id. `null` has no key.
pub fn value_to_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => match map.get("$oid") {
            Some(Value::String(oid)) => Some(oid.clone()),
            _ => Some(value.to_string()),
        },
        Value::Array(_) => Some(value.to_string()),
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_key(&value).ok_or_else(|| D::Error::custom("record identifier must not be null"))
}

fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn deserialize_state<'de, D>(deserializer: D) -> std::result::Result<StateLabel, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn deserialize_refs<'de, D>(deserializer: D) -> std::result::Result<Vec<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(refs.iter().map(value_to_key).collect())
}

fn deserialize_origin<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        single => vec![single],
    })
}

/// A raw state-change event as delivered by the data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event identifier, used for deduplication
    #[serde(rename = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    /// Unparsed date/time text (JSON numbers are read as epoch milliseconds)
    #[serde(default, deserialize_with = "deserialize_text")]
    pub time: String,
    /// Event type label
    #[serde(rename = "type", default, deserialize_with = "deserialize_text")]
    pub event_type: String,
    /// State label; `""`, `null`, `false` and a missing field all mean no state
    #[serde(
        default,
        deserialize_with = "deserialize_state",
        skip_serializing_if = "Option::is_none"
    )]
    pub state: StateLabel,
    /// Identifiers of the constructs this event touches (entries may be null)
    #[serde(default, deserialize_with = "deserialize_refs")]
    pub related_constructs: Vec<Option<String>>,
    /// Fields the processor does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEvent {
    /// Create an event without state or related constructs
    pub fn new(id: impl Into<String>, time: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            time: time.into(),
            event_type: event_type.into(),
            state: None,
            related_constructs: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Builder method: set the state label (empty labels mean no state)
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        let state = state.into();
        self.state = if state.is_empty() { None } else { Some(state) };
        self
    }

    /// Builder method: add a related construct reference
    pub fn with_related(mut self, construct_id: impl Into<String>) -> Self {
        self.related_constructs.push(Some(construct_id.into()));
        self
    }

    /// The state label with all whitespace removed
    pub fn stripped_state(&self) -> Option<String> {
        self.state.as_deref().map(strip_whitespace)
    }
}

/// A raw tracked entity ("construct"), e.g. an issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawConstruct {
    /// Construct identifier, referenced by `RawEvent::related_constructs`
    #[serde(rename = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    /// Construct type label
    #[serde(rename = "type", default, deserialize_with = "deserialize_text")]
    pub construct_type: String,
    /// Origin records; only the first one is used for row identifiers
    #[serde(
        default,
        deserialize_with = "deserialize_origin",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub origin_id: Vec<Value>,
    /// Remaining fields, reachable through a dotted row-identifier path
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawConstruct {
    /// Create a construct with no origin and no extra fields
    pub fn new(id: impl Into<String>, construct_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            construct_type: construct_type.into(),
            origin_id: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Builder method: set an extra field
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Builder method: append an origin record
    pub fn with_origin(mut self, origin: Value) -> Self {
        self.origin_id.push(origin);
        self
    }

    /// Resolve a row identifier by walking `path` into this construct, or into
    /// its first origin record when `from_origin` is set.
    ///
    /// Returns `None` when any segment is missing or the value is `null`.
    pub fn resolve_key(&self, path: &[String], from_origin: bool) -> Option<String> {
        if from_origin {
            return walk(self.origin_id.first()?, path).and_then(value_to_key);
        }

        let (head, rest) = path.split_first()?;
        match head.as_str() {
            "_id" if rest.is_empty() => Some(self.id.clone()),
            "type" if rest.is_empty() => Some(self.construct_type.clone()),
            "_id" | "type" => None,
            "origin_id" => {
                let (index, rest) = rest.split_first()?;
                let origin = self.origin_id.get(index.parse::<usize>().ok()?)?;
                walk(origin, rest).and_then(value_to_key)
            }
            _ => walk(self.extra.get(head)?, rest).and_then(value_to_key),
        }
    }
}

fn walk<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// A construct after indexing, tagged with its display row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedConstruct {
    #[serde(flatten)]
    pub construct: RawConstruct,
    /// Display row identifier (anonymized label or resolved raw identifier)
    #[serde(rename = "rowId")]
    pub row_id: String,
}

/// A per-construct copy of a raw event
///
/// One raw event produces one projection for every distinct, known construct
/// it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedEvent {
    #[serde(rename = "_id")]
    pub id: String,
    /// Parsed event time
    pub time: Timestamp,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: StateLabel,
    pub related_constructs: Vec<Option<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Display row of the construct this copy belongs to
    #[serde(rename = "rowId")]
    pub row_id: String,
}

impl ProjectedEvent {
    /// Copy the known fields and the extra bag of `raw` onto a row
    pub fn project(raw: &RawEvent, time: Timestamp, row_id: impl Into<String>) -> Self {
        Self {
            id: raw.id.clone(),
            time,
            event_type: raw.event_type.clone(),
            state: raw.state.clone(),
            related_constructs: raw.related_constructs.clone(),
            extra: raw.extra.clone(),
            row_id: row_id.into(),
        }
    }

    /// The state label, or `""` when the event has none
    pub fn state_label(&self) -> &str {
        self.state.as_deref().unwrap_or_default()
    }
}

/// A single interval during which a row held one state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lifespan {
    pub row_id: String,
    pub start: Timestamp,
    pub state: String,
    /// `None` while the interval is still open (unresolved)
    pub end: Option<Timestamp>,
}

impl Lifespan {
    /// True if the lifespan has not been resolved
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Display time frame `[start, end]`, padded and aligned to whole days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeFrame {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeFrame {
    /// Pad the observed `[min, max]` range by one day on each side and
    /// truncate both ends to midnight (UTC).
    pub fn padded(min: Timestamp, max: Timestamp) -> Self {
        Self {
            start: crate::time::shift_days(crate::time::start_of_day(min), -1),
            end: crate::time::shift_days(crate::time::start_of_day(max), 1),
        }
    }
}

/// Data-quality counters collected while processing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingReport {
    /// Constructs ignored because their identifier was already seen
    pub duplicate_constructs: usize,
    /// Events ignored because their identifier was already seen
    pub duplicate_events: usize,
    /// Constructs whose row-identifier path did not resolve
    pub unresolved_constructs: usize,
    /// `null` entries in `related_constructs`
    pub null_references: usize,
    /// References to constructs that are not in the input
    pub dangling_references: usize,
    /// Events dropped because their time could not be parsed
    pub invalid_timestamps: usize,
    /// Projected events emitted
    pub projected_events: usize,
    /// Projected events that carried a classified state label
    pub category_events: usize,
}

/// The complete dataset handed to a timeline renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDataset {
    /// Projected events in timeline order
    pub events: Vec<ProjectedEvent>,
    /// Lifespans of every row, grouped by row
    pub lifespans: Vec<Lifespan>,
    /// Padded display frame; `None` when no event was retained
    pub timeframe: Option<TimeFrame>,
    /// Sorted vocabulary of state labels
    pub statechanges: Vec<String>,
    /// Sorted vocabulary of event types
    pub types: Vec<String>,
    /// Row identifiers in top-to-bottom display order
    pub ids: Vec<String>,
    /// Constructs that have at least one lifespan
    pub constructs: Vec<IndexedConstruct>,
    pub longest_type: String,
    pub longest_id: String,
    pub report: ProcessingReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_normalization() {
        let events: Vec<RawEvent> = serde_json::from_value(json!([
            {"_id": "1", "time": "2024-01-01", "type": "Created", "state": ""},
            {"_id": "2", "time": "2024-01-01", "type": "Created", "state": null},
            {"_id": "3", "time": "2024-01-01", "type": "Created", "state": false},
            {"_id": "4", "time": "2024-01-01", "type": "Created"},
            {"_id": "5", "time": "2024-01-01", "type": "Created", "state": "In Progress"}
        ]))
        .unwrap();

        assert!(events[..4].iter().all(|e| e.state.is_none()));
        assert_eq!(events[4].state.as_deref(), Some("In Progress"));
    }

    #[test]
    fn test_identifier_normalization() {
        let event: RawEvent = serde_json::from_value(json!({
            "_id": {"$oid": "abc123"},
            "time": 1_700_000_000_000_i64,
            "type": "Commented",
            "related_constructs": [7, null, "x"],
            "author": "dev"
        }))
        .unwrap();

        assert_eq!(event.id, "abc123");
        assert_eq!(event.time, "1700000000000");
        assert_eq!(
            event.related_constructs,
            vec![Some("7".to_string()), None, Some("x".to_string())]
        );
        assert_eq!(event.extra.get("author"), Some(&json!("dev")));
    }

    #[test]
    fn test_resolve_key_paths() {
        let construct: RawConstruct = serde_json::from_value(json!({
            "_id": "c1",
            "type": "issue",
            "data": {"key": "PRJ-7", "number": 7},
            "origin_id": [{"source_id": "gh-42", "context": "repo"}]
        }))
        .unwrap();

        let path = |p: &str| p.split('.').map(str::to_string).collect::<Vec<_>>();

        assert_eq!(construct.resolve_key(&path("_id"), false), Some("c1".to_string()));
        assert_eq!(construct.resolve_key(&path("data.key"), false), Some("PRJ-7".to_string()));
        assert_eq!(construct.resolve_key(&path("data.number"), false), Some("7".to_string()));
        assert_eq!(construct.resolve_key(&path("source_id"), true), Some("gh-42".to_string()));
        assert_eq!(
            construct.resolve_key(&path("origin_id.0.context"), false),
            Some("repo".to_string())
        );
        assert_eq!(construct.resolve_key(&path("data.missing"), false), None);
        assert_eq!(construct.resolve_key(&path("_id.nested"), false), None);
    }

    #[test]
    fn test_single_origin_object_is_accepted() {
        let construct: RawConstruct = serde_json::from_value(json!({
            "_id": "c1",
            "origin_id": {"source_id": "only"}
        }))
        .unwrap();

        assert_eq!(construct.origin_id.len(), 1);
        assert_eq!(construct.construct_type, "");
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace(" In\tProgress \n"), "InProgress");

        let event = RawEvent::new("e1", "2024-01-01", "Moved").with_state("In Review");
        assert_eq!(event.stripped_state().as_deref(), Some("InReview"));
        assert_eq!(RawEvent::new("e2", "2024-01-01", "Moved").stripped_state(), None);
    }

    #[test]
    fn test_projected_event_serialization() {
        let raw = RawEvent::new("e1", "2024-03-01T10:00:00Z", "Opened")
            .with_state("Open")
            .with_related("c1");
        let time = crate::time::parse_timestamp(&raw.time).unwrap();
        let projected = ProjectedEvent::project(&raw, time, "ROW-1");

        let value = serde_json::to_value(&projected).unwrap();
        assert_eq!(value["_id"], "e1");
        assert_eq!(value["type"], "Opened");
        assert_eq!(value["rowId"], "ROW-1");
        assert_eq!(value["state"], "Open");
    }
}

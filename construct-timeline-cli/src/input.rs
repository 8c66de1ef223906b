//! Reading raw constructs and events from JSON files

use anyhow::{Context, Result};
use construct_timeline::{RawConstruct, RawEvent};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read a JSON array of records
fn read_records<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("Failed to open {} file: {:?}", kind, path))?;
    let records: Vec<T> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {} file: {:?}", kind, path))?;
    log::debug!("Read {} {} from {:?}", records.len(), kind, path);
    Ok(records)
}

pub fn load_constructs(path: &Path) -> Result<Vec<RawConstruct>> {
    read_records(path, "constructs")
}

pub fn load_events(path: &Path) -> Result<Vec<RawEvent>> {
    read_records(path, "events")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_records() {
        let dir = tempfile::tempdir().unwrap();
        let constructs = dir.path().join("constructs.json");
        let events = dir.path().join("events.json");
        fs::write(&constructs, r#"[{"_id": 1, "type": "issue"}]"#).unwrap();
        fs::write(
            &events,
            r#"[{"_id": "e1", "time": "2024-01-01", "type": "Open", "state": false, "related_constructs": [1]}]"#,
        )
        .unwrap();

        let constructs = load_constructs(&constructs).unwrap();
        let events = load_events(&events).unwrap();
        assert_eq!(constructs[0].id, "1");
        assert_eq!(events[0].related_constructs, vec![Some("1".to_string())]);
        assert!(events[0].state.is_none());
    }

    #[test]
    fn test_malformed_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_events(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse events file"));
    }
}

//! Build a timeline dataset from an inline issue history
//!
//! Usage:
//!   cargo run -p construct-timeline --example build_timeline
//!
//! Set RUST_LOG=debug to see the per-stage log output.

use construct_timeline::{ProcessedDataset, ProcessorConfig, RawConstruct, RawEvent, TimelineProcessor};
use serde_json::json;

fn print_dataset(dataset: &ProcessedDataset) {
    println!("=== TIMELINE ===");
    if let Some(frame) = &dataset.timeframe {
        println!("Frame: {} .. {}", frame.start.date_naive(), frame.end.date_naive());
    }
    println!("States: {}", dataset.statechanges.join(", "));
    println!("Types:  {}", dataset.types.join(", "));

    for row in &dataset.ids {
        println!("\n{}", row);
        for lifespan in dataset.lifespans.iter().filter(|l| &l.row_id == row) {
            let end = lifespan
                .end
                .map(|e| e.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "open".to_string());
            println!(
                "  {:<12} {} -> {}",
                lifespan.state,
                lifespan.start.format("%Y-%m-%d %H:%M"),
                end
            );
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let constructs: Vec<RawConstruct> = serde_json::from_value(json!([
        {"_id": "c1", "type": "bug", "origin_id": [{"source_id": "PRJ-101"}]},
        {"_id": "c2", "type": "feature", "origin_id": [{"source_id": "PRJ-102"}]},
        {"_id": "c3", "type": "bug", "origin_id": [{"source_id": "PRJ-103"}]}
    ]))?;

    let events: Vec<RawEvent> = serde_json::from_value(json!([
        {"_id": "e1", "time": "2024-04-01T09:00:00Z", "type": "created", "state": "Open", "related_constructs": ["c1", "c2"]},
        {"_id": "e2", "time": "2024-04-02T10:30:00Z", "type": "moved", "state": "In Progress", "related_constructs": ["c1"]},
        {"_id": "e3", "time": "2024-04-03T16:00:00Z", "type": "resolved", "state": "Closed", "related_constructs": ["c1"]},
        {"_id": "e4", "time": "2024-04-04T08:15:00Z", "type": "reopened", "state": "Open", "related_constructs": ["c1"]},
        {"_id": "e5", "time": "2024-04-05T11:00:00Z", "type": "commented", "related_constructs": ["c2", "c3"]},
        {"_id": "e6", "time": "2024-04-06T12:00:00Z", "type": "resolved", "state": "Closed", "related_constructs": ["c2"]}
    ]))?;

    let config = ProcessorConfig::new()
        .with_row_id_path("source_id")
        .with_origin_row_ids(true)
        .add_start_state("Open")
        .add_intermediate_state("InProgress")
        .add_resolution_state("Closed");

    let processor = TimelineProcessor::new(config)?;
    let dataset = processor.process(&constructs, &events)?;

    print_dataset(&dataset);
    println!("\n{}", serde_json::to_string_pretty(&dataset.report)?);

    Ok(())
}

//! Report generation
//!
//! Renders a processed dataset as JSON (for timeline renderers) or as a
//! plain-text summary.

use crate::config::OutputFormat;
use anyhow::Result;
use chrono::SecondsFormat;
use construct_timeline::{ProcessedDataset, Timestamp};
use std::fmt::{self, Write};

const RULE: &str = "───────────────────────────────────────────────";

pub fn render(dataset: &ProcessedDataset, format: OutputFormat, pretty: bool) -> Result<String> {
    Ok(match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(dataset)?,
        OutputFormat::Json => serde_json::to_string(dataset)?,
        OutputFormat::Summary => render_summary(dataset),
    })
}

fn stamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Plain-text summary of a dataset
pub fn render_summary(dataset: &ProcessedDataset) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut out, dataset);
    out
}

fn write_summary(out: &mut String, dataset: &ProcessedDataset) -> fmt::Result {
    let report = &dataset.report;

    writeln!(out, "Timeline Summary")?;
    writeln!(out, "{}", RULE)?;
    match &dataset.timeframe {
        Some(frame) => writeln!(out, "Time frame:   {} .. {}", stamp(&frame.start), stamp(&frame.end))?,
        None => writeln!(out, "Time frame:   (no events)")?,
    }
    writeln!(out, "Rows:         {}", dataset.ids.len())?;
    writeln!(out, "Lifespans:    {}", dataset.lifespans.len())?;
    writeln!(out, "Events:       {}", dataset.events.len())?;
    writeln!(out, "States:       {}", dataset.statechanges.join(", "))?;
    writeln!(out, "Types:        {}", dataset.types.join(", "))?;

    writeln!(out, "\nData quality")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Duplicate constructs:   {}", report.duplicate_constructs)?;
    writeln!(out, "Duplicate events:       {}", report.duplicate_events)?;
    writeln!(out, "Unresolved constructs:  {}", report.unresolved_constructs)?;
    writeln!(out, "Null references:        {}", report.null_references)?;
    writeln!(out, "Dangling references:    {}", report.dangling_references)?;
    writeln!(out, "Invalid timestamps:     {}", report.invalid_timestamps)?;

    writeln!(out, "\nRows")?;
    writeln!(out, "{}", RULE)?;
    let width = dataset.longest_id.chars().count().max(4);
    for row in &dataset.ids {
        // Only the first lifespan of a row carries the row label.
        let spans = dataset.lifespans.iter().filter(|l| &l.row_id == row);
        for (i, lifespan) in spans.enumerate() {
            let label = if i == 0 { row.as_str() } else { "" };
            let end = lifespan.end.as_ref().map(stamp).unwrap_or_else(|| "open".to_string());
            writeln!(
                out,
                "{:<width$}  {} -> {}  {}",
                label,
                stamp(&lifespan.start),
                end,
                lifespan.state,
                width = width
            )?;
        }
    }

    Ok(())
}

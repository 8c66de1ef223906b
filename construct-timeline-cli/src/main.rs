//! Construct Timeline CLI Application
//!
//! Command-line front end for the construct-timeline library. It adds:
//! - Reading constructs and events from JSON files
//! - TOML configuration with command-line overrides
//! - JSON and plain-text summary output
//! - Batch processing of several datasets in parallel

use anyhow::{bail, Context, Result};
use clap::Parser;
use construct_timeline::{ProcessorConfig, TimelineProcessor};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

mod config;
mod input;
mod report;

use config::{AppConfig, DatasetConfig, OutputFormat};

/// Construct Timeline - Build lifespan timelines from construct state changes
#[derive(Parser, Debug)]
#[command(name = "construct-timeline-cli")]
#[command(about = "Build lifespan timelines from construct state-change events", long_about = None)]
#[command(version)]
struct Args {
    /// JSON file with the constructs (array of records)
    #[arg(long, value_name = "FILE", requires = "events")]
    constructs: Option<PathBuf>,

    /// JSON file with the events (array of records)
    #[arg(long, value_name = "FILE", requires = "constructs")]
    events: Option<PathBuf>,

    /// Path to configuration file (timeline.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output file for the dataset (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Dotted path to the row identifier of a construct
    #[arg(long, value_name = "PATH")]
    row_id_path: Option<String>,

    /// Resolve the row identifier path against the first origin record
    #[arg(long)]
    from_origin: bool,

    /// Replace row identifiers with sequential labels
    #[arg(long)]
    anonymize: bool,

    /// Prefix for anonymized labels (implies --anonymize)
    #[arg(long, value_name = "PREFIX")]
    label_prefix: Option<String>,

    /// Drop events with unparseable times instead of failing
    #[arg(long)]
    skip_invalid_timestamps: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration
    fn processor_config(&self, app: &AppConfig) -> ProcessorConfig {
        let mut config = app.processor_config();
        if let Some(path) = &self.row_id_path {
            config = config.with_row_id_path(path.clone());
        }
        if self.from_origin {
            config = config.with_origin_row_ids(true);
        }
        if let Some(prefix) = &self.label_prefix {
            config = config.with_anonymization(prefix.clone());
        } else if self.anonymize && !config.anonymize {
            config = config.with_anonymization("");
        }
        if self.skip_invalid_timestamps {
            config = config.with_skip_invalid_timestamps(true);
        }
        config
    }

    fn output_format(&self, app: &AppConfig) -> OutputFormat {
        self.format.unwrap_or(app.output.format)
    }

    fn pretty(&self, app: &AppConfig) -> bool {
        self.pretty || app.output.pretty
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Construct Timeline CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using timeline library v{}", construct_timeline::VERSION);

    let app = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let (Some(constructs), Some(events)) = (&args.constructs, &args.events) {
        single_mode(&args, &app, constructs, events)?;
    } else if !app.datasets.is_empty() {
        batch_mode(&args, &app)?;
    } else {
        // No input - show help
        println!("Construct Timeline - No input specified");
        println!("\nQuick Start:");
        println!("  construct-timeline-cli --constructs constructs.json --events events.json");
        println!("  construct-timeline-cli --constructs c.json --events e.json --format summary");
        println!("\nFor batch processing:");
        println!("  construct-timeline-cli --config timeline.toml   (with [[datasets]] entries)");
        println!("\nUse --help for more options");
    }

    Ok(())
}

/// Process one constructs/events pair and write the result to --output or stdout
fn single_mode(args: &Args, app: &AppConfig, constructs: &Path, events: &Path) -> Result<()> {
    let processor = TimelineProcessor::new(args.processor_config(app))?;

    let constructs = input::load_constructs(constructs)?;
    let events = input::load_events(events)?;
    let dataset = processor.process(&constructs, &events)?;
    let rendered = report::render(&dataset, args.output_format(app), args.pretty(app))?;

    match &args.output {
        Some(path) => {
            write_output(path, &rendered)?;
            log::info!("Wrote {} rows to {:?}", dataset.ids.len(), path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Process every [[datasets]] entry of the config file in parallel
fn batch_mode(args: &Args, app: &AppConfig) -> Result<()> {
    let processor = TimelineProcessor::new(args.processor_config(app))?;
    let format = args.output_format(app);
    let pretty = args.pretty(app);

    log::info!("Processing {} datasets", app.datasets.len());

    let results: Vec<(String, Result<usize>)> = app
        .datasets
        .par_iter()
        .map(|dataset| (dataset.label(), run_dataset(&processor, dataset, format, pretty)))
        .collect();

    let mut failures = 0;
    for (label, result) in &results {
        match result {
            Ok(rows) => log::info!("{}: {} rows", label, rows),
            Err(e) => {
                failures += 1;
                log::error!("{}: {:#}", label, e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} datasets failed", failures, results.len());
    }
    Ok(())
}

fn run_dataset(
    processor: &TimelineProcessor,
    dataset: &DatasetConfig,
    format: OutputFormat,
    pretty: bool,
) -> Result<usize> {
    let constructs = input::load_constructs(&dataset.constructs)?;
    let events = input::load_events(&dataset.events)?;
    let processed = processor
        .process(&constructs, &events)
        .with_context(|| format!("Failed to process dataset {}", dataset.label()))?;
    let rendered = report::render(&processed, format, pretty)?;
    write_output(&dataset.output, &rendered)?;
    Ok(processed.ids.len())
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write output file: {:?}", path))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

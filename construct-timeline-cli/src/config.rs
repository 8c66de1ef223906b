//! Configuration loading and parsing

use anyhow::{Context, Result};
use construct_timeline::{ProcessorConfig, StateSets};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rows: RowsConfig,
    #[serde(default)]
    pub states: StateSets,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RowsConfig {
    /// Dotted path to the row identifier (default: "_id")
    pub id_path: Option<String>,
    #[serde(default)]
    pub from_origin: bool,
    #[serde(default)]
    pub anonymize: bool,
    #[serde(default)]
    pub label_prefix: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default)]
    pub skip_invalid_timestamps: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Summary,
}

/// One constructs/events pair processed in batch mode
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    pub name: Option<String>,
    pub constructs: PathBuf,
    pub events: PathBuf,
    pub output: PathBuf,
}

impl DatasetConfig {
    /// Name used in log messages
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.output.display().to_string())
    }

    fn resolve_against(&mut self, base: &Path) {
        for path in [&mut self.constructs, &mut self.events, &mut self.output] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

impl AppConfig {
    /// Processor configuration described by this file
    pub fn processor_config(&self) -> ProcessorConfig {
        let mut config = ProcessorConfig::new()
            .with_origin_row_ids(self.rows.from_origin)
            .with_states(self.states.clone())
            .with_skip_invalid_timestamps(self.input.skip_invalid_timestamps);
        if let Some(path) = &self.rows.id_path {
            config = config.with_row_id_path(path.clone());
        }
        if self.rows.anonymize {
            config = config.with_anonymization(self.rows.label_prefix.clone());
        }
        config
    }
}

/// Load configuration from a TOML file
///
/// Relative dataset paths are resolved against the directory of the file.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for dataset in &mut config.datasets {
        dataset.resolve_against(base);
    }

    Ok(config)
}

//! Configuration for the report runner.
//!
//! Loaded from (in priority order):
//! 1. Environment variables (`OLYMPICS__` prefix, `__` separator)
//! 2. Config file (`olympics.toml` by default)
//! 3. Defaults

use olympics_graph::GraphConfig;
use serde::Deserialize;

use crate::error::Result;
use crate::sink::OutputFormat;

/// Chart output settings, from the `[report]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReportConfig {
    /// Directory receiving the chart files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default)]
    pub format: OutputFormat,
}

fn default_output_dir() -> String {
    "./charts".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
        }
    }
}

fn load(file_prefix: &str) -> Result<config::Config> {
    Ok(config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("OLYMPICS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?)
}

/// Load the `[report]` section, falling back to defaults when absent.
pub fn load_report_config(file_prefix: &str) -> Result<ReportConfig> {
    let cfg = load(file_prefix)?;
    match cfg.get::<ReportConfig>("report") {
        Ok(c) => Ok(c),
        Err(config::ConfigError::NotFound(_)) => Ok(ReportConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Load the `[neo4j]` section; every missing key keeps its default.
pub fn load_graph_config(file_prefix: &str) -> Result<GraphConfig> {
    let cfg = load(file_prefix)?;
    let defaults = GraphConfig::default();

    Ok(GraphConfig {
        uri: cfg.get_string("neo4j.uri").unwrap_or(defaults.uri),
        user: cfg.get_string("neo4j.user").unwrap_or(defaults.user),
        password: cfg
            .get_string("neo4j.password")
            .unwrap_or(defaults.password),
        database: cfg
            .get_string("neo4j.database")
            .unwrap_or(defaults.database),
        timeout_secs: cfg
            .get_int("neo4j.timeout_secs")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(defaults.timeout_secs),
        ..defaults
    })
}

//! Error types for the olympics-report crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Graph error: {0}")]
    Graph(#[from] olympics_graph::GraphError),

    #[error("Column `{column}` holds a non-numeric value: {source}")]
    NotNumeric {
        column: String,
        #[source]
        source: olympics_core::CoreError,
    },

    #[error("Missing column `{0}` in result set")]
    MissingColumn(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

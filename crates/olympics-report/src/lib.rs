//! olympics-report: Chart reports over the Olympic knowledge graph.
//!
//! Queries an athlete's tweets, medals, disciplines and edition sex ratios
//! from Neo4j, reshapes the rows into aligned series, and emits one chart per
//! view to a sink (SVG or JSON files for the CLI).

pub mod chart;
pub mod config;
pub mod error;
pub mod merge;
pub mod projector;
pub mod render;
pub mod session;
pub mod sink;
pub mod types;

pub use error::ReportError;
pub use session::ReportSession;
pub use sink::{ChartSink, FileSink, OutputFormat};
pub use types::{MedalCharts, RunSummary};

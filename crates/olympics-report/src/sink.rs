//! Chart output.
//!
//! Reports hand finished [`ChartSpec`]s to a [`ChartSink`]. The sink decides
//! what "display" means; the CLI writes one file per chart plus a run
//! manifest instead of opening interactive windows.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chart::{ChartKind, ChartSpec};
use crate::error::Result;
use crate::render::render_svg;

const MANIFEST_FILE: &str = "manifest.json";
const MAX_SLUG_LEN: usize = 60;

/// File format for emitted charts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Standalone SVG image.
    #[default]
    Svg,
    /// The chart spec as JSON, for custom frontends.
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Json => "json",
        }
    }
}

/// Receives every chart a report produces.
pub trait ChartSink {
    fn emit(&mut self, chart: &ChartSpec) -> Result<()>;

    /// Called once when the session closes.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A chart written by a [`FileSink`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ManifestEntry {
    pub file: String,
    pub kind: ChartKind,
    pub title: String,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    format: OutputFormat,
    charts: &'a [ManifestEntry],
}

/// Writes each chart as `<dir>/<NN>-<slug>.<ext>` and a `manifest.json`
/// listing them when finished.
pub struct FileSink {
    dir: PathBuf,
    format: OutputFormat,
    run_id: Uuid,
    entries: Vec<ManifestEntry>,
}

impl FileSink {
    /// Create the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let run_id = Uuid::new_v4();
        tracing::info!(run_id = %run_id, dir = %dir.display(), ?format, "Chart output ready");
        Ok(Self {
            dir,
            format,
            run_id,
            entries: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }
}

impl ChartSink for FileSink {
    fn emit(&mut self, chart: &ChartSpec) -> Result<()> {
        let file = format!(
            "{:02}-{}.{}",
            self.entries.len() + 1,
            slugify(&chart.title),
            self.format.extension()
        );
        let path = self.dir.join(&file);

        let body = match self.format {
            OutputFormat::Svg => render_svg(chart),
            OutputFormat::Json => serde_json::to_string_pretty(chart)?,
        };
        std::fs::write(&path, body)?;

        tracing::debug!(path = %path.display(), kind = ?chart.kind, "Chart written");
        self.entries.push(ManifestEntry {
            file,
            kind: chart.kind,
            title: chart.title.clone(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let manifest = Manifest {
            run_id: self.run_id,
            generated_at: Utc::now(),
            format: self.format,
            charts: &self.entries,
        };
        let path = self.dir.join(MANIFEST_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;

        tracing::info!(
            run_id = %self.run_id,
            charts = self.entries.len(),
            manifest = %path.display(),
            "Chart run complete"
        );
        Ok(())
    }
}

/// Lowercase ASCII slug for file names.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "chart".to_string()
    } else {
        slug.to_string()
    }
}

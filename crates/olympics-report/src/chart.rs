//! Chart construction: pure data → drawable chart specs.
//!
//! Nothing here touches the filesystem; see [`crate::sink`] for output.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Ordered line over year-like categories.
    Line,
    /// Categorical bars.
    Bar,
    /// Two slices: subject vs. remainder.
    Pie,
}

/// A fully described chart, ready to be rendered by any sink.
///
/// For pies, `categories` holds the slice labels and `values` the slice
/// sizes; the axis labels are unused.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub values: Vec<i64>,
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn line_chart(
    title: impl Into<String>,
    x_label: impl Into<String>,
    y_label: impl Into<String>,
    categories: Vec<String>,
    values: Vec<i64>,
) -> ChartSpec {
    series_chart(ChartKind::Line, title, x_label, y_label, categories, values)
}

pub fn bar_chart(
    title: impl Into<String>,
    x_label: impl Into<String>,
    y_label: impl Into<String>,
    categories: Vec<String>,
    values: Vec<i64>,
) -> ChartSpec {
    series_chart(ChartKind::Bar, title, x_label, y_label, categories, values)
}

fn series_chart(
    kind: ChartKind,
    title: impl Into<String>,
    x_label: impl Into<String>,
    y_label: impl Into<String>,
    categories: Vec<String>,
    values: Vec<i64>,
) -> ChartSpec {
    debug_assert_eq!(categories.len(), values.len());
    ChartSpec {
        kind,
        title: title.into(),
        x_label: x_label.into(),
        y_label: y_label.into(),
        categories,
        values,
    }
}

/// A pie chart plus the data-integrity warning raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub chart: ChartSpec,
    pub warning: Option<String>,
}

/// Build a subject-vs-remainder pie.
///
/// The whole is `total`, or 1 when `total` is zero. The remainder is
/// `whole - subject`, never negative. A subject larger than the total is
/// inconsistent data and is reported through [`PieChart::warning`].
pub fn pie_chart(
    title: impl Into<String>,
    subject_label: impl Into<String>,
    remainder_label: impl Into<String>,
    subject: i64,
    total: i64,
) -> PieChart {
    let whole = if total == 0 { 1 } else { total };
    let subject_slice = subject.max(0);
    let remainder = whole.saturating_sub(subject_slice).max(0);

    let warning = (subject > total || subject < 0).then(|| {
        format!("inconsistent data: subject value {subject} exceeds total {total} (or is negative)")
    });

    PieChart {
        chart: ChartSpec {
            kind: ChartKind::Pie,
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            categories: vec![subject_label.into(), remainder_label.into()],
            values: vec![subject_slice, remainder],
        },
        warning,
    }
}

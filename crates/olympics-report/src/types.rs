//! Report results returned by the session.
//!
//! These are the data behind each chart, handed back to the caller after the
//! charts have been emitted.

use serde::Serialize;

/// Tweets mentioning the athlete, per year.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PostCountReport {
    pub years: Vec<String>,
    pub posts: Vec<i64>,
}

/// One games year of the medal report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MedalRow {
    pub year: i64,
    pub medals: i64,
    pub country_total: i64,
    /// Share of the country's medals won by the athlete, in percent.
    pub percent: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MedalReport {
    pub rows: Vec<MedalRow>,
}

/// Which medal charts to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedalCharts {
    /// Bar chart of medals per year.
    pub count: bool,
    /// One pie per year: athlete vs. rest of the country.
    pub percent: bool,
}

impl Default for MedalCharts {
    fn default() -> Self {
        Self {
            count: true,
            percent: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DisciplineReport {
    pub disciplines: Vec<String>,
    pub participations: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SexCompositionRow {
    pub year: i64,
    pub same_sex: i64,
    pub total: i64,
    pub other_sex: i64,
}

/// Sex ratio of every edition the athlete played in.
///
/// `sex` is `None` when the athlete's sex is not recorded; `rows` is then
/// empty.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SexCompositionReport {
    pub sex: Option<String>,
    pub rows: Vec<SexCompositionRow>,
}

/// An athlete recorded under the requested name.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HomonymCandidate {
    pub born: Option<String>,
    pub country: Option<String>,
}

/// Everything produced by a full run.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunSummary {
    pub posts: PostCountReport,
    pub medals: MedalReport,
    pub disciplines: DisciplineReport,
    pub sex_composition: SexCompositionReport,
}

//! Core domain types for the Olympic reports.
//!
//! The graph itself (athletes, countries, games editions, results, medals,
//! disciplines, tweets) lives in Neo4j and is never mutated from here. These
//! types describe what a caller asks for and what comes back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

// ── Athlete Filter ────────────────────────────────────────────────

/// Identifies the athlete a report is about.
///
/// A name alone is not unique in the graph: homonyms exist. The optional
/// birth date and represented country narrow the match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AthleteFilter {
    pub name: String,
    pub born: Option<String>,
    pub country: Option<String>,
}

impl AthleteFilter {
    /// Create a name-only filter. Fails on a blank name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CoreError::EmptyName);
        }
        Ok(Self {
            name,
            born: None,
            country: None,
        })
    }

    /// Set the birth date ("YYYY-MM-DD"). Blank values are ignored.
    pub fn with_born(mut self, born: Option<impl Into<String>>) -> Self {
        self.born = non_blank(born);
        self
    }

    /// Set the represented country. Blank values are ignored.
    pub fn with_country(mut self, country: Option<impl Into<String>>) -> Self {
        self.country = non_blank(country);
        self
    }

    /// Which disambiguation variant this filter selects.
    ///
    /// Birth date takes precedence over country when both are present.
    pub fn disambiguation(&self) -> Disambiguation {
        if self.born.is_some() {
            Disambiguation::BirthDate
        } else if self.country.is_some() {
            Disambiguation::Country
        } else {
            Disambiguation::NameOnly
        }
    }
}

fn non_blank(value: Option<impl Into<String>>) -> Option<String> {
    value
        .map(|v| v.into().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// How an athlete is matched in a query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Disambiguation {
    /// Name and birth date. Unique in nearly all cases.
    BirthDate,
    /// Name and represented country.
    Country,
    /// Name only. Homonyms are aggregated together.
    NameOnly,
}

impl Disambiguation {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::NameOnly)
    }
}

impl fmt::Display for Disambiguation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BirthDate => write!(f, "name+birth_date"),
            Self::Country => write!(f, "name+country"),
            Self::NameOnly => write!(f, "name_only"),
        }
    }
}

// ── Result Values ─────────────────────────────────────────────────

/// A scalar cell of a result row.
///
/// Years and counts arrive either as integers or as strings holding numbers
/// (e.g. `substring(t.date, 0, 4)`), so numeric consumers go through
/// [`CellValue::to_i64`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Coerce to an integer. `Null` counts as zero, floats are truncated.
    pub fn to_i64(&self) -> Result<i64> {
        match self {
            Self::Null => Ok(0),
            Self::Int(i) => Ok(*i),
            Self::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            Self::Float(f) => Err(CoreError::NotNumeric {
                value: f.to_string(),
            }),
            Self::Text(s) => parse_numeric(s),
        }
    }

    /// Display label, used for chart categories.
    pub fn label(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{f:.0}"),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

fn parse_numeric(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f.trunc() as i64),
        _ => Err(CoreError::NotNumeric {
            value: raw.to_string(),
        }),
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One result row: column alias → cell.
pub type ResultRow = BTreeMap<String, CellValue>;

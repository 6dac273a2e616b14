//! olympics-core: Shared domain types for the Olympic graph reports.
//!
//! This crate provides the foundational types used by the graph client and
//! the report pipeline:
//! - Athlete filters and the disambiguation variant they select
//! - Scalar cell values as returned by the store, with numeric coercion
//! - Common error types

pub mod error;
pub mod types;

pub use error::CoreError;
pub use types::{AthleteFilter, CellValue, Disambiguation, ResultRow};

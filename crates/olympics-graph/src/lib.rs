//! Olympics Graph: Neo4j client for the Olympic knowledge graph.
//!
//! All graph reads flow through this crate. Queries are built from a fixed
//! set of templates with bound parameters and executed read-only against
//! the configured database.

pub mod client;
pub mod executor;
pub mod queries;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use executor::{QueryExecutor, QueryOutcome};
pub use queries::{BuiltQuery, CypherQuery, QueryShape};

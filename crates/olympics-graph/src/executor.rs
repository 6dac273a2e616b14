//! The seam between report logic and the store.
//!
//! Reports depend on [`QueryExecutor`] rather than on [`crate::GraphClient`]
//! directly, so they can run against any source of rows.

use std::future::Future;

use olympics_core::ResultRow;

use crate::client::GraphError;
use crate::queries::CypherQuery;

/// Rows returned by one query plus execution metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    pub rows: Vec<ResultRow>,
    pub row_count: usize,
    pub elapsed_ms: u64,
}

impl QueryOutcome {
    pub fn new(rows: Vec<ResultRow>, elapsed_ms: u64) -> Self {
        Self {
            row_count: rows.len(),
            rows,
            elapsed_ms,
        }
    }
}

/// Executes a finished read query and returns its rows in store order.
pub trait QueryExecutor {
    fn execute(
        &self,
        query: &CypherQuery,
    ) -> impl Future<Output = Result<QueryOutcome, GraphError>> + Send;
}

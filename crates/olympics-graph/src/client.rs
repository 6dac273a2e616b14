//! Neo4j connection management and shared graph client.

use std::time::{Duration, Instant};

use std::future::Future;

use neo4rs::{BoltType, ConfigBuilder, Graph};
use olympics_core::{CellValue, ResultRow};

use crate::executor::{QueryExecutor, QueryOutcome};
use crate::queries::CypherQuery;

/// Errors from graph operations.
///
/// `Connection` and `Timeout` are transport-level and worth retrying;
/// `Query` means the store rejected the Cypher text itself.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {source} (query: {query})")]
    Query {
        query: String,
        #[source]
        source: neo4rs::Error,
    },

    #[error("Neo4j query timed out after {seconds}s (query: {query})")]
    Timeout { seconds: u64, query: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GraphError {
    /// Whether the caller may retry the operation (with backoff).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout { .. })
    }

    fn from_driver(err: neo4rs::Error, query: &str) -> Self {
        if is_transport_error(&err) {
            Self::Connection(err.to_string())
        } else {
            Self::Query {
                query: query.to_string(),
                source: err,
            }
        }
    }
}

fn is_transport_error(err: &neo4rs::Error) -> bool {
    matches!(
        err,
        neo4rs::Error::IOError { .. }
            | neo4rs::Error::ConnectionError
            | neo4rs::Error::AuthenticationError(_)
    )
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Database (catalog) holding the Olympic graph.
    pub database: String,
    pub max_connections: u32,
    pub fetch_size: usize,
    /// Upper bound for a single query round-trip.
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "neo4j://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: "jeuxolympiques".to_string(),
            max_connections: 16,
            fetch_size: 256,
            timeout_secs: 30,
        }
    }
}

/// Neo4j graph client bound to the Olympic database.
///
/// Only ever runs the read queries produced by [`crate::queries`].
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    timeout: Duration,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        // The pool connects lazily; ping so bad credentials fail here.
        let timeout = Duration::from_secs(config.timeout_secs);
        tokio::time::timeout(timeout, graph.run(neo4rs::query("RETURN 1")))
            .await
            .map_err(|_| GraphError::Connection(format!("no answer from {}", config.uri)))?
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, database = %config.database, "Connected to Neo4j");
        Ok(Self { graph, timeout })
    }

    /// Execute a read query and collect all rows, projected onto the
    /// query's declared columns.
    async fn fetch_rows(&self, cypher: &CypherQuery) -> Result<Vec<ResultRow>, GraphError> {
        let mut stream = self
            .graph
            .execute(cypher.to_neo4j())
            .await
            .map_err(|e| GraphError::from_driver(e, &cypher.text))?;

        let mut rows = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| GraphError::from_driver(e, &cypher.text))?
        {
            rows.push(row_to_record(&row, cypher)?);
        }
        Ok(rows)
    }
}

impl QueryExecutor for GraphClient {
    async fn execute(&self, cypher: &CypherQuery) -> Result<QueryOutcome, GraphError> {
        let start = Instant::now();
        let rows = with_timeout(self.timeout, &cypher.text, self.fetch_rows(cypher)).await?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            query = %cypher.text,
            records = rows.len(),
            elapsed_ms,
            "Query executed"
        );

        Ok(QueryOutcome::new(rows, elapsed_ms))
    }
}

/// Bound a store call by `limit`; expiry becomes [`GraphError::Timeout`]
/// carrying the query text.
async fn with_timeout<T, F>(limit: Duration, query: &str, call: F) -> Result<T, GraphError>
where
    F: Future<Output = Result<T, GraphError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| GraphError::Timeout {
            seconds: limit.as_secs(),
            query: query.to_string(),
        })?
}

/// Convert a neo4rs::Row into a column → cell map over the query's
/// declared columns.
fn row_to_record(row: &neo4rs::Row, cypher: &CypherQuery) -> Result<ResultRow, GraphError> {
    let mut record = ResultRow::new();
    for column in cypher.columns {
        let value = row.get::<BoltType>(column).map_err(|e| {
            GraphError::Serialization(format!(
                "column `{column}` missing from row ({e}) (query: {})",
                cypher.text
            ))
        })?;
        record.insert((*column).to_string(), decode_cell(column, &value)?);
    }
    Ok(record)
}

/// Only Bolt null maps to [`CellValue::Null`]. Dates become ISO text;
/// lists, maps, graph elements and other temporal types are rejected.
fn decode_cell(column: &str, value: &BoltType) -> Result<CellValue, GraphError> {
    match value {
        BoltType::Null(_) => Ok(CellValue::Null),
        BoltType::Integer(i) => Ok(CellValue::Int(i.value)),
        BoltType::Float(f) => Ok(CellValue::Float(f.value)),
        BoltType::String(s) => Ok(CellValue::Text(s.value.clone())),
        BoltType::Date(d) => chrono::NaiveDate::try_from(d)
            .map(|date| CellValue::Text(date.to_string()))
            .map_err(|e| GraphError::Serialization(format!("column `{column}`: {e}"))),
        other => Err(GraphError::Serialization(format!(
            "column `{column}`: unsupported value {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphConfig::default();
        assert_eq!(config.uri, "neo4j://localhost:7687");
        assert_eq!(config.database, "jeuxolympiques");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(GraphError::Connection("refused".into()).is_retryable());
        assert!(GraphError::Timeout {
            seconds: 30,
            query: "MATCH (n) RETURN n".into()
        }
        .is_retryable());
        assert!(!GraphError::Serialization("bad row".into()).is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out_with_query_text() {
        let result: Result<(), GraphError> = with_timeout(
            Duration::from_secs(30),
            "MATCH (a:athlete) RETURN a",
            std::future::pending(),
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.is_retryable());
        match err {
            GraphError::Timeout { seconds, query } => {
                assert_eq!(seconds, 30);
                assert_eq!(query, "MATCH (a:athlete) RETURN a");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_passes_through() {
        let ok = with_timeout(Duration::from_secs(30), "RETURN 1", async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = with_timeout(Duration::from_secs(30), "RETURN 1", async {
            Err::<(), _>(GraphError::Connection("refused".into()))
        })
        .await;
        assert!(matches!(err, Err(GraphError::Connection(_))));
    }

    #[test]
    fn test_decode_supported_cells() {
        assert_eq!(
            decode_cell("annee", &BoltType::from(2004_i64)).unwrap(),
            CellValue::Int(2004)
        );
        assert_eq!(
            decode_cell("ratio", &BoltType::from(0.5_f64)).unwrap(),
            CellValue::Float(0.5)
        );
        assert_eq!(
            decode_cell("sexe", &BoltType::from("F")).unwrap(),
            CellValue::from("F")
        );
        assert_eq!(
            decode_cell("born", &BoltType::Null(neo4rs::BoltNull)).unwrap(),
            CellValue::Null
        );

        let born = chrono::NaiveDate::from_ymd_opt(1985, 8, 21).unwrap();
        assert_eq!(
            decode_cell("born", &BoltType::from(born)).unwrap(),
            CellValue::from("1985-08-21")
        );
    }

    #[test]
    fn test_decode_rejects_unsupported_cells() {
        let list = BoltType::from(vec![BoltType::from(1_i64)]);
        match decode_cell("annee", &list) {
            Err(GraphError::Serialization(msg)) => assert!(msg.contains("annee")),
            other => panic!("expected serialization error, got {other:?}"),
        }
        assert!(matches!(
            decode_cell("flag", &BoltType::from(true)),
            Err(GraphError::Serialization(_))
        ));
    }

    #[test]
    fn test_transport_errors_map_to_connection() {
        let err = GraphError::from_driver(neo4rs::Error::ConnectionError, "MATCH (n) RETURN n");
        assert!(matches!(err, GraphError::Connection(_)));
    }

    #[test]
    fn test_query_errors_keep_query_text() {
        let err = GraphError::from_driver(
            neo4rs::Error::UnexpectedMessage("SyntaxError".into()),
            "MATCH (n RETURN n",
        );
        match err {
            GraphError::Query { query, .. } => assert_eq!(query, "MATCH (n RETURN n"),
            other => panic!("expected query error, got {other:?}"),
        }
    }
}

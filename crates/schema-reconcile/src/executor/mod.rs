//! Statement execution abstraction.
//!
//! The reconciler funnels every DDL statement and introspection probe through
//! one [`SqlExecutor`] handle. The handle is produced lazily on first use
//! from a caller-supplied [`ConnectionSource`]; reconciliation is strictly
//! sequential, so a single backend connection is sufficient.

mod postgres;

pub use postgres::{PgConnectionSource, PgExecutor};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// A single value read from a backend catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

/// One introspection result row, keyed by column name (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct SqlRow {
    values: HashMap<String, ScalarValue>,
}

impl SqlRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, used by executors and test fixtures.
    pub fn with(mut self, column: impl Into<String>, value: ScalarValue) -> Self {
        self.values.insert(column.into().to_lowercase(), value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.values.get(&column.to_lowercase())
    }

    /// Value as text. Numeric and boolean values are rendered, SQL NULL is
    /// absent.
    pub fn get_text(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            ScalarValue::Text(value) => Some(value.clone()),
            ScalarValue::Int(value) => Some(value.to_string()),
            ScalarValue::Bool(value) => Some(value.to_string()),
            ScalarValue::Null => None,
        }
    }

    /// Value as an integer; SQL NULL and non-numeric text are absent.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            ScalarValue::Int(value) => Some(*value),
            ScalarValue::Text(value) => value.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Executes SQL against one backend.
///
/// `execute` issues DDL; the query methods back the dialect existence and
/// introspection probes. Every parameter in this system is an identifier
/// string, so parameters are plain `&str`.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute a statement, discarding any result.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Run a query and collect the first column of every row.
    async fn query_scalars(&self, sql: &str, params: &[&str]) -> Result<Vec<ScalarValue>>;

    /// Run a query and collect full rows.
    async fn query_rows(&self, sql: &str, params: &[&str]) -> Result<Vec<SqlRow>>;
}

/// Produces the executor for a backend, on first use.
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn SqlExecutor>>;
}

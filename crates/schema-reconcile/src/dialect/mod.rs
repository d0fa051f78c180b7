//! Backend dialects (Strategy pattern).
//!
//! One implementation per backend family translates abstract column types to
//! native types, supplies the catalog existence/introspection queries, and
//! encodes backend-specific sizing and alteration-syntax rules. Dialects are
//! selected through [`DialectKind`] — an explicit configuration value passed
//! to the reconciler at construction, not a process-wide registry.

pub mod h2;
pub mod oracle;
pub mod postgres;

pub use h2::H2Dialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;

use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::schema::{ColumnDescription, ColumnType, TableDescription};
use crate::error::{Result, SchemaError};
use crate::executor::SqlExecutor;

const DEFAULT_STRING_COLUMN_SIZE: i32 = 50;
const MAX_STRING_COLUMN_SIZE: i32 = 4000;
const DEFAULT_NUMBER_COLUMN_SIZE: i32 = 11;
const DEFAULT_LONG_COLUMN_SIZE: i32 = 19;
const DEFAULT_RAW_COLUMN_SIZE: i32 = 16;

/// Explicit numeric sizes declare a maximum representable value, not a digit
/// count; one digit of headroom plus the sign is reserved.
fn num_of_digits(size: i32) -> i32 {
    (size as f64).log10() as i32 + 2
}

/// Supported backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Oracle,
    Postgres,
    H2,
}

impl DialectKind {
    /// Display name of the backend family.
    pub fn name(self) -> &'static str {
        match self {
            DialectKind::Oracle => "Oracle",
            DialectKind::Postgres => "PostgreSQL",
            DialectKind::H2 => "H2",
        }
    }

    /// The dialect implementation for this backend.
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            DialectKind::Oracle => &OracleDialect,
            DialectKind::Postgres => &PostgresDialect,
            DialectKind::H2 => &H2Dialect,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Changes to apply to one live column, computed by the reconciler.
#[derive(Debug, Clone, Default)]
pub struct ColumnDelta {
    /// The declared size is strictly greater than the live size.
    pub widen_size: bool,
    /// The live column is not-nullable but the declaration is nullable.
    pub loosen_nullability: bool,
    /// The default value diverges.
    pub default_change: Option<DefaultChange>,
}

impl ColumnDelta {
    pub fn is_empty(&self) -> bool {
        !self.widen_size && !self.loosen_nullability && self.default_change.is_none()
    }
}

/// Direction of a default-value alteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultChange {
    Set(String),
    Drop,
}

/// Pre-composed DDL fragments handed to [`Dialect::alter_column_statements`].
#[derive(Debug, Clone)]
pub struct AlterClause {
    /// Bare column name.
    pub column_name: String,
    /// Full column clause restricted to the delta's parts (Oracle batches
    /// this into a single `modify (...)`).
    pub full_clause: String,
    /// Native type with size suffix, e.g. `VARCHAR(30)`.
    pub type_with_size: String,
}

/// Backend capability set.
///
/// Sizing-policy defaults implement the shared rules (fixed defaults, upper
/// bound clamping, value-to-digit-count conversion); backends with
/// unconstrained-width native numerics override them to return `0` (no size
/// clause). Introspection defaults report the capability as unsupported; the
/// reconciler consults [`Dialect::supports_reconciliation`] before calling.
#[async_trait]
pub trait Dialect: Send + Sync {
    fn kind(&self) -> DialectKind;

    /// Native type used to declare a column of the given abstract type.
    fn native_type(&self, column_type: ColumnType) -> &'static str;

    /// The same type in the vocabulary the backend's own catalog reports,
    /// where that differs from the declaration syntax.
    fn metadata_type(&self, column_type: ColumnType) -> &'static str {
        self.native_type(column_type)
    }

    /// Identifier case-folding applied before catalog comparisons.
    fn fold_identifier(&self, identifier: &str) -> String {
        identifier.to_string()
    }

    /// Existence probe for a table; one bind parameter (table name).
    fn table_existence_query(&self) -> &'static str;

    /// Existence probe for an index; two bind parameters (index, table).
    fn index_existence_query(&self) -> &'static str;

    async fn table_exists(&self, table_name: &str, executor: &dyn SqlExecutor) -> Result<bool> {
        let table = self.fold_identifier(table_name);
        let rows = executor
            .query_scalars(self.table_existence_query(), &[table.as_str()])
            .await?;
        Ok(!rows.is_empty())
    }

    async fn index_exists(
        &self,
        index_name: &str,
        table_name: &str,
        executor: &dyn SqlExecutor,
    ) -> Result<bool> {
        let index = self.fold_identifier(index_name);
        let table = self.fold_identifier(table_name);
        let rows = executor
            .query_scalars(self.index_existence_query(), &[index.as_str(), table.as_str()])
            .await?;
        Ok(!rows.is_empty())
    }

    /// Whether the update path can run against this backend at all.
    fn supports_reconciliation(&self) -> bool {
        true
    }

    /// Introspect live columns: name, native type, size, nullability, and
    /// default (catalog `null` sentinel normalized to absence).
    async fn columns_of(
        &self,
        table_name: &str,
        executor: &dyn SqlExecutor,
    ) -> Result<HashMap<String, ColumnDescription>> {
        let _ = (table_name, executor);
        Err(SchemaError::unsupported(
            self.kind().name(),
            "column introspection",
        ))
    }

    /// Live primary-key constraint name, if any.
    async fn primary_key_name(
        &self,
        table_name: &str,
        executor: &dyn SqlExecutor,
    ) -> Result<Option<String>> {
        let _ = (table_name, executor);
        Err(SchemaError::unsupported(
            self.kind().name(),
            "primary key introspection",
        ))
    }

    /// Live non-PK index names (the PK-backing index is excluded).
    async fn indexes_of(
        &self,
        table_name: &str,
        executor: &dyn SqlExecutor,
    ) -> Result<HashSet<String>> {
        let _ = (table_name, executor);
        Err(SchemaError::unsupported(
            self.kind().name(),
            "index introspection",
        ))
    }

    /// Whether a PK constraint needs an explicit backing index created first.
    fn pk_requires_index(&self) -> bool;

    fn boolean_column_size(&self) -> i32 {
        1
    }

    fn varbinary_column_size(&self, required_size: Option<i32>) -> i32 {
        match required_size {
            None | Some(0) => DEFAULT_RAW_COLUMN_SIZE,
            Some(size) => size,
        }
    }

    fn integer_column_size(&self, required_size: Option<i32>) -> i32 {
        match required_size {
            None | Some(0) => DEFAULT_NUMBER_COLUMN_SIZE,
            Some(size) => num_of_digits(size),
        }
    }

    fn long_column_size(&self, required_size: Option<i32>) -> i32 {
        match required_size {
            None | Some(0) => DEFAULT_LONG_COLUMN_SIZE,
            Some(size) => num_of_digits(size),
        }
    }

    fn varchar_column_size(
        &self,
        table_name: &str,
        column_name: &str,
        required_size: Option<i32>,
    ) -> i32 {
        match required_size {
            None | Some(0) => {
                debug!(
                    "Column [{}.{}] is of size 0; using {}",
                    table_name, column_name, DEFAULT_STRING_COLUMN_SIZE
                );
                DEFAULT_STRING_COLUMN_SIZE
            }
            Some(size) if size > MAX_STRING_COLUMN_SIZE => {
                debug!(
                    "Column [{}.{}] is of size greater than {}; trimming to {}",
                    table_name, column_name, MAX_STRING_COLUMN_SIZE, MAX_STRING_COLUMN_SIZE
                );
                MAX_STRING_COLUMN_SIZE
            }
            Some(size) => size,
        }
    }

    /// Expression-index syntax over the lower-cased value of one column.
    /// The default is "not supported": the bare parenthesised column.
    fn lower_index_expression(&self, column_name: &str) -> String {
        format!("({column_name})")
    }

    /// Full ALTER statement adding one column clause to a table.
    fn add_column_statement(&self, table_name: &str, column_sql: &str) -> String;

    /// Append `check (...)` clauses to a create-table statement. The default
    /// is "not supported": no-op.
    fn append_check_constraints(
        &self,
        table: &TableDescription,
        sql: &mut String,
        expression_separator: &str,
    ) {
        let _ = (table, sql, expression_separator);
    }

    /// Inheritance clause appended to `create table`, where supported.
    fn table_inheritance_clause(&self, parent_table_name: &str) -> Option<String> {
        let _ = parent_table_name;
        None
    }

    /// Storage-hint statement for a compressed column, where supported.
    fn compressed_storage_statement(&self, table_name: &str, column_name: &str) -> Option<String> {
        let _ = (table_name, column_name);
        None
    }

    /// Statements applying `delta` to a live column. Backends without live
    /// alteration support emit nothing.
    fn alter_column_statements(
        &self,
        table_name: &str,
        delta: &ColumnDelta,
        clause: &AlterClause,
    ) -> Vec<String> {
        let _ = (table_name, delta, clause);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_count_reserves_headroom() {
        assert_eq!(num_of_digits(5), 2);
        assert_eq!(num_of_digits(10), 3);
        assert_eq!(num_of_digits(99), 3);
        assert_eq!(num_of_digits(12345), 6);
    }

    #[test]
    fn default_sizing_policy() {
        let dialect = &OracleDialect;
        assert_eq!(dialect.integer_column_size(None), 11);
        assert_eq!(dialect.integer_column_size(Some(0)), 11);
        assert_eq!(dialect.long_column_size(None), 19);
        assert_eq!(dialect.varbinary_column_size(None), 16);
        assert_eq!(dialect.varbinary_column_size(Some(64)), 64);
        assert_eq!(dialect.boolean_column_size(), 1);
    }

    #[test]
    fn varchar_sizing_clamps_to_upper_bound() {
        let dialect = &OracleDialect;
        assert_eq!(dialect.varchar_column_size("T", "C", None), 50);
        assert_eq!(dialect.varchar_column_size("T", "C", Some(20)), 20);
        assert_eq!(dialect.varchar_column_size("T", "C", Some(9000)), 4000);
    }

    #[test]
    fn kind_selects_dialect() {
        assert_eq!(DialectKind::Oracle.dialect().kind(), DialectKind::Oracle);
        assert_eq!(DialectKind::Postgres.dialect().kind(), DialectKind::Postgres);
        assert_eq!(DialectKind::H2.dialect().kind(), DialectKind::H2);
    }

    #[test]
    fn kind_deserializes_from_lowercase() {
        let kind: DialectKind = serde_yaml::from_str("postgres").unwrap();
        assert_eq!(kind, DialectKind::Postgres);
    }
}

//! Oracle-family dialect.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::core::schema::{ColumnDescription, ColumnType};
use crate::error::Result;
use crate::executor::SqlExecutor;

use super::{AlterClause, ColumnDelta, Dialect, DialectKind};

/// Catalog query for live column facts; `DATA_PRECISION` carries the size of
/// `NUMBER` columns, `DATA_LENGTH` everything else.
pub const COLUMNS_QUERY: &str = "SELECT COLUMN_NAME, DATA_TYPE, DATA_LENGTH, DATA_PRECISION, \
     NULLABLE, DATA_DEFAULT FROM USER_TAB_COLUMNS WHERE TABLE_NAME = :1";

pub const PRIMARY_KEY_QUERY: &str =
    "SELECT CONSTRAINT_NAME FROM USER_CONSTRAINTS WHERE TABLE_NAME = :1 AND CONSTRAINT_TYPE = 'P'";

pub const INDEXES_QUERY: &str = "SELECT INDEX_NAME FROM USER_IND_COLUMNS WHERE TABLE_NAME = :1";

/// Oracle dialect implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

#[async_trait]
impl Dialect for OracleDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn native_type(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::Boolean
            | ColumnType::Integer
            | ColumnType::Long
            | ColumnType::Float
            | ColumnType::Double
            | ColumnType::Id => "NUMBER",
            ColumnType::Date => "DATE",
            ColumnType::Varbinary => "RAW",
            ColumnType::Varchar | ColumnType::UuidString => "VARCHAR2",
            ColumnType::Blob => "BLOB",
            ColumnType::Clob => "CLOB",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    fn table_existence_query(&self) -> &'static str {
        "select 1 from user_tables where table_name = :1"
    }

    fn index_existence_query(&self) -> &'static str {
        "select 1 from user_indexes where index_name = :1 and table_name = :2"
    }

    async fn columns_of(
        &self,
        table_name: &str,
        executor: &dyn SqlExecutor,
    ) -> Result<HashMap<String, ColumnDescription>> {
        let mut columns = HashMap::new();

        for row in executor.query_rows(COLUMNS_QUERY, &[table_name]).await? {
            let Some(column_name) = row.get_text("COLUMN_NAME") else {
                continue;
            };

            // The catalog reports an absent default as the literal "null".
            let default_value = row
                .get_text("DATA_DEFAULT")
                .filter(|value| value.trim() != "null");

            let native_type = row.get_text("DATA_TYPE").unwrap_or_default();
            let size = if native_type == "NUMBER" {
                row.get_i64("DATA_PRECISION").unwrap_or(0)
            } else {
                row.get_i64("DATA_LENGTH").unwrap_or(0)
            } as i32;

            let nullable = row.get_text("NULLABLE").as_deref() == Some("Y");

            let column = ColumnDescription::introspected(&column_name)
                .with_size(size)
                .set_nullable(nullable)
                .with_native_type(native_type)
                .with_live_default(default_value);
            columns.insert(column.name().to_string(), column);
        }

        Ok(columns)
    }

    async fn primary_key_name(
        &self,
        table_name: &str,
        executor: &dyn SqlExecutor,
    ) -> Result<Option<String>> {
        let mut names = executor
            .query_scalars(PRIMARY_KEY_QUERY, &[table_name])
            .await?;
        if names.is_empty() {
            return Ok(None);
        }
        Ok(match names.remove(0) {
            crate::executor::ScalarValue::Text(name) => Some(name),
            _ => None,
        })
    }

    async fn indexes_of(
        &self,
        table_name: &str,
        executor: &dyn SqlExecutor,
    ) -> Result<HashSet<String>> {
        let pk = self.primary_key_name(table_name, executor).await?;

        let mut index_names = HashSet::new();
        for value in executor.query_scalars(INDEXES_QUERY, &[table_name]).await? {
            let crate::executor::ScalarValue::Text(index_name) = value else {
                continue;
            };
            if pk
                .as_deref()
                .is_some_and(|pk| pk.eq_ignore_ascii_case(&index_name))
            {
                continue;
            }
            index_names.insert(index_name);
        }

        Ok(index_names)
    }

    fn pk_requires_index(&self) -> bool {
        true
    }

    fn lower_index_expression(&self, column_name: &str) -> String {
        format!("lower({column_name})")
    }

    fn add_column_statement(&self, table_name: &str, column_sql: &str) -> String {
        format!("alter table {table_name} add ({column_sql})")
    }

    fn alter_column_statements(
        &self,
        table_name: &str,
        delta: &ColumnDelta,
        clause: &AlterClause,
    ) -> Vec<String> {
        // Compatible alterations are batched into one modify clause.
        if delta.is_empty() {
            return Vec::new();
        }
        vec![format!(
            "alter table {table_name} modify ({})",
            clause.full_clause
        )]
    }
}

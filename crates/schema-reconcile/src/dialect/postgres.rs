//! PostgreSQL-family dialect.
//!
//! PostgreSQL folds unquoted identifiers to lower case, reports `VARCHAR`
//! columns as `character varying` in its catalog, and stores defaults with a
//! trailing type cast (`'x'::character varying`) that must be stripped before
//! comparison.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::core::schema::{ColumnDescription, ColumnType, TableDescription};
use crate::error::Result;
use crate::executor::{ScalarValue, SqlExecutor};

use super::{AlterClause, ColumnDelta, DefaultChange, Dialect, DialectKind};

const VARCHAR_METADATA_NOTATION: &str = "character varying";

pub const COLUMNS_QUERY: &str = "select column_name, data_type, character_maximum_length, \
     is_nullable, column_default from information_schema.columns where table_name = $1";

pub const PRIMARY_KEY_QUERY: &str = "select conname from pg_constraint where conrelid = \
     (select oid from pg_class where relname = $1) and contype = 'p'";

pub const INDEXES_QUERY: &str = "select indexname from pg_indexes where tablename = $1";

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Strip the `::type` cast and outer quotes from a catalog default.
    fn normalize_default(value: String) -> String {
        let mut value = value;
        if !value.is_empty() {
            if let Some(pos) = value.find("::") {
                value.truncate(pos);
            }
            if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
                value = value[1..value.len() - 1].to_string();
            }
        }
        value
    }

    fn truthy(value: &str) -> bool {
        value.eq_ignore_ascii_case("true")
            || value.eq_ignore_ascii_case("t")
            || value.eq_ignore_ascii_case("1")
            || value.eq_ignore_ascii_case("yes")
    }
}

#[async_trait]
impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn native_type(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "INTEGER",
            ColumnType::Long | ColumnType::Id => "BIGINT",
            ColumnType::Float => "DOUBLE",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Date => "TIMESTAMP WITHOUT TIME ZONE",
            ColumnType::Varbinary | ColumnType::Blob => "BYTEA",
            ColumnType::Varchar | ColumnType::UuidString => "VARCHAR",
            ColumnType::Clob => "TEXT",
            ColumnType::Timestamp => "TIMESTAMP WITH TIME ZONE",
        }
    }

    fn metadata_type(&self, column_type: ColumnType) -> &'static str {
        match self.native_type(column_type) {
            "VARCHAR" => VARCHAR_METADATA_NOTATION,
            native => native,
        }
    }

    fn fold_identifier(&self, identifier: &str) -> String {
        identifier.to_lowercase()
    }

    fn table_existence_query(&self) -> &'static str {
        "select 1 from pg_tables where tablename = $1"
    }

    fn index_existence_query(&self) -> &'static str {
        "select 1 from pg_indexes where indexname = $1 and tablename = $2"
    }

    async fn columns_of(
        &self,
        table_name: &str,
        executor: &dyn SqlExecutor,
    ) -> Result<HashMap<String, ColumnDescription>> {
        let table = self.fold_identifier(table_name);
        let mut columns = HashMap::new();

        for row in executor.query_rows(COLUMNS_QUERY, &[table.as_str()]).await? {
            let Some(column_name) = row.get_text("column_name") else {
                continue;
            };

            let default_value = row.get_text("column_default").map(Self::normalize_default);

            let native_type = row.get_text("data_type").unwrap_or_default();
            let size = if native_type == VARCHAR_METADATA_NOTATION {
                row.get_i64("character_maximum_length").unwrap_or(0)
            } else {
                0
            } as i32;

            let nullable = row
                .get_text("is_nullable")
                .is_some_and(|value| Self::truthy(&value));

            let column = ColumnDescription::introspected(&column_name)
                .set_nullable(nullable)
                .with_size(size)
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
        let table = self.fold_identifier(table_name);
        let mut names = executor
            .query_scalars(PRIMARY_KEY_QUERY, &[table.as_str()])
            .await?;
        if names.is_empty() {
            return Ok(None);
        }
        Ok(match names.remove(0) {
            ScalarValue::Text(name) => Some(name),
            _ => None,
        })
    }

    async fn indexes_of(
        &self,
        table_name: &str,
        executor: &dyn SqlExecutor,
    ) -> Result<HashSet<String>> {
        let pk = self.primary_key_name(table_name, executor).await?;

        let table = self.fold_identifier(table_name);
        let mut index_names = HashSet::new();
        for value in executor
            .query_scalars(INDEXES_QUERY, &[table.as_str()])
            .await?
        {
            let ScalarValue::Text(index_name) = value else {
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
        false
    }

    fn boolean_column_size(&self) -> i32 {
        0
    }

    fn varbinary_column_size(&self, _required_size: Option<i32>) -> i32 {
        0
    }

    fn integer_column_size(&self, _required_size: Option<i32>) -> i32 {
        0
    }

    fn long_column_size(&self, _required_size: Option<i32>) -> i32 {
        0
    }

    fn lower_index_expression(&self, column_name: &str) -> String {
        format!("((lower({column_name})))")
    }

    fn add_column_statement(&self, table_name: &str, column_sql: &str) -> String {
        format!("alter table {table_name} add column {column_sql}")
    }

    fn append_check_constraints(
        &self,
        table: &TableDescription,
        sql: &mut String,
        expression_separator: &str,
    ) {
        let mut separator = expression_separator;
        for check in table.checks() {
            sql.push_str(separator);
            sql.push_str(&format!("check ({check})"));
            separator = ", ";
        }
    }

    fn table_inheritance_clause(&self, parent_table_name: &str) -> Option<String> {
        Some(format!(" inherits ({parent_table_name})"))
    }

    fn compressed_storage_statement(&self, table_name: &str, column_name: &str) -> Option<String> {
        Some(format!(
            "alter table {table_name} alter column {column_name} set storage external"
        ))
    }

    fn alter_column_statements(
        &self,
        table_name: &str,
        delta: &ColumnDelta,
        clause: &AlterClause,
    ) -> Vec<String> {
        let prefix = format!("alter table {table_name} alter column {}", clause.column_name);

        let mut statements = Vec::new();
        if delta.widen_size {
            statements.push(format!("{prefix} type {}", clause.type_with_size));
        }
        if delta.loosen_nullability {
            statements.push(format!("{prefix} drop not null"));
        }
        match &delta.default_change {
            Some(DefaultChange::Set(value)) => {
                statements.push(format!("{prefix} set default '{value}'"));
            }
            Some(DefaultChange::Drop) => {
                statements.push(format!("{prefix} drop default"));
            }
            None => {}
        }

        statements
    }
}

//! Reconciliation engine.
//!
//! For each desired [`TableDescription`] the engine asks the active dialect
//! whether the table exists, then either creates it from scratch (columns,
//! primary key, indexes, checks, join tables) or diffs the live schema and
//! issues the minimal set of alterations. Reconciliation is stateless and
//! idempotent: required DDL is re-derived from the live catalog on every
//! invocation, and a converged table produces no statements at all.

mod ddl;

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::config::ReconcilerConfig;
use crate::core::naming::{compose_index_name, compose_pk_name};
use crate::core::schema::{
    ColumnDescription, ColumnType, IndexDescription, TableDescription, TableSource,
};
use crate::dialect::{AlterClause, ColumnDelta, DefaultChange, Dialect, DialectKind};
use crate::error::{Result, SchemaError};
use crate::executor::{ConnectionSource, PgConnectionSource, SqlExecutor};

/// Boolean defaults are compared by truthiness, not literal equality:
/// `"true"`, `"t"` and `"1"` all denote the same live value.
fn same_boolean_values(required: Option<&str>, from_db: Option<&str>) -> bool {
    fn truthy(value: Option<&str>) -> bool {
        matches!(
            value,
            Some(v) if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("t") || v == "1"
        )
    }
    truthy(required) == truthy(from_db)
}

/// Converges declared table schemas against a live backend.
///
/// The backend executor is constructed lazily from the configured
/// [`ConnectionSource`] on first use; constructing a reconciler is always
/// cheap and never touches the network.
pub struct SchemaReconciler {
    dialect: &'static dyn Dialect,
    source: Option<Box<dyn ConnectionSource>>,
    executor: OnceCell<Arc<dyn SqlExecutor>>,
}

impl SchemaReconciler {
    /// Create a reconciler for a backend family, without a connection source.
    /// The first backend access fails with a configuration error until a
    /// source or executor is supplied.
    pub fn new(kind: DialectKind) -> Self {
        Self {
            dialect: kind.dialect(),
            source: None,
            executor: OnceCell::new(),
        }
    }

    /// Supply the connection source used to build the executor on first use.
    pub fn with_connection_source(mut self, source: impl ConnectionSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Supply a pre-built executor (tests, or transports this crate does not
    /// ship, e.g. an Oracle connection).
    pub fn with_executor(self, executor: Arc<dyn SqlExecutor>) -> Self {
        // A freshly created cell accepts exactly one value.
        let _ = self.executor.set(executor);
        self
    }

    /// Build a reconciler from configuration. Only the PostgreSQL family has
    /// a built-in transport; other backends need a caller-supplied executor.
    pub fn from_config(config: &ReconcilerConfig) -> Result<Self> {
        config.validate()?;
        match config.backend {
            DialectKind::Postgres => Ok(Self::new(config.backend)
                .with_connection_source(PgConnectionSource::new(config.connection.clone()))),
            other => Err(SchemaError::Config(format!(
                "no built-in connection source for the {other} backend; supply an executor"
            ))),
        }
    }

    pub fn dialect_kind(&self) -> DialectKind {
        self.dialect.kind()
    }

    async fn executor(&self) -> Result<&Arc<dyn SqlExecutor>> {
        self.executor
            .get_or_try_init(|| async {
                match &self.source {
                    Some(source) => source.connect().await,
                    None => Err(SchemaError::Config(
                        "no connection source configured".to_string(),
                    )),
                }
            })
            .await
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        self.executor().await?.execute(sql).await
    }

    // ===== Exposed operations =====

    /// Create the table if absent, reconcile it otherwise; then process its
    /// join tables the same way.
    pub async fn create_table(&self, table: &TableDescription) -> Result<()> {
        table.validate()?;
        self.converge(table).await
    }

    /// Process a batch of descriptions. One table's failure does not abort
    /// the batch: errors are logged with the offending table and the
    /// successfully processed descriptions are returned.
    pub async fn create_tables(&self, tables: Vec<TableDescription>) -> Vec<TableDescription> {
        let mut successful = Vec::new();
        for table in tables {
            match self.create_table(&table).await {
                Ok(()) => successful.push(table),
                Err(e) => error!("Failed to create or update {}: {}", table, e),
            }
        }
        successful
    }

    /// Create or reconcile the table described by a [`TableSource`].
    pub async fn create_table_from_source(&self, source: &dyn TableSource) -> Result<()> {
        self.create_table(&source.table_description()).await
    }

    /// Batch variant of [`Self::create_table_from_source`].
    pub async fn create_tables_from_sources(
        &self,
        sources: &[&dyn TableSource],
    ) -> Vec<TableDescription> {
        let tables = sources
            .iter()
            .map(|source| source.table_description())
            .collect();
        self.create_tables(tables).await
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let executor = self.executor().await?;
        self.dialect.table_exists(table_name, executor.as_ref()).await
    }

    pub async fn index_exists(&self, index_name: &str, table_name: &str) -> Result<bool> {
        let executor = self.executor().await?;
        self.dialect
            .index_exists(index_name, table_name, executor.as_ref())
            .await
    }

    /// Create one secondary index (skipped when it already exists).
    pub async fn create_index(
        &self,
        table: &TableDescription,
        index: &IndexDescription,
    ) -> Result<()> {
        index.validate()?;
        let index_name = compose_index_name(index, table.table_name());
        self.create_named_index(&table.full_table_name(), index, &index_name)
            .await
    }

    /// Create the primary key: backing index first where the dialect needs
    /// one, then the constraint over the same column order.
    pub async fn create_primary_key(&self, table: &TableDescription) -> Result<()> {
        let Some(pk) = table.primary_key() else {
            return Ok(());
        };

        let full_table_name = table.full_table_name();
        let pk_name = compose_pk_name(table.table_name());

        info!("Creating primary key [{}] for table {}", pk_name, full_table_name);

        if self.dialect.pk_requires_index() {
            self.create_named_index(&full_table_name, pk, &pk_name).await?;
        }

        self.add_pk_constraint(&full_table_name, pk, &pk_name).await
    }

    // ===== Create path =====

    fn converge<'a>(
        &'a self,
        table: &'a TableDescription,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let table_name = table.table_name();

            if !self.table_exists(table_name).await? {
                let sql = ddl::compose_table_creation_sql(self.dialect, table)?;
                info!("Creating table {}", table_name);
                self.execute(&sql).await?;

                for column in table.columns().values() {
                    self.set_compressed_storage(table, column).await?;
                }

                self.create_primary_key(table).await?;
                self.create_indexes(table).await?;
            } else {
                self.update_table(table).await?;
            }

            for join_table in table.join_tables() {
                self.converge(join_table).await?;
            }

            Ok(())
        })
    }

    async fn create_indexes(&self, table: &TableDescription) -> Result<()> {
        for index in table.indexes() {
            self.create_index(table, index).await?;
        }
        Ok(())
    }

    async fn create_named_index(
        &self,
        table_name: &str,
        index: &IndexDescription,
        index_name: &str,
    ) -> Result<()> {
        if self.index_exists(index_name, table_name).await? {
            return Ok(());
        }
        let sql = ddl::compose_index_creation_sql(self.dialect, index, index_name, table_name);
        info!("Creating {} index [{}] for table {}", index_name, index, table_name);
        self.execute(&sql).await
    }

    async fn add_pk_constraint(
        &self,
        table_name: &str,
        primary_key: &IndexDescription,
        pk_name: &str,
    ) -> Result<()> {
        info!("Adding PK constraint [{}] for table {}", pk_name, table_name);
        let columns = primary_key.column_names().join(", ");
        let sql =
            format!("alter table {table_name} add constraint {pk_name} primary key ({columns})");
        self.execute(&sql).await
    }

    async fn set_compressed_storage(
        &self,
        table: &TableDescription,
        column: &ColumnDescription,
    ) -> Result<()> {
        if !column.is_compressed() {
            return Ok(());
        }
        if let Some(sql) = self
            .dialect
            .compressed_storage_statement(&table.full_table_name(), column.name())
        {
            self.execute(&sql).await?;
        }
        Ok(())
    }

    // ===== Update path =====

    async fn update_table(&self, table: &TableDescription) -> Result<()> {
        if !self.dialect.supports_reconciliation() {
            debug!(
                "{} does not support reconciliation; leaving table {} as is",
                self.dialect.kind(),
                table.table_name()
            );
            return Ok(());
        }

        let table_name = table.table_name();
        let executor = self.executor().await?;

        let existing_columns = self
            .dialect
            .columns_of(table_name, executor.as_ref())
            .await?;
        for column in table.columns().values() {
            match existing_columns.get(column.name()) {
                Some(existing) => self.update_column(table_name, existing, column).await?,
                None => self.create_column(table, column).await?,
            }
        }

        // Index reconciliation is all-or-nothing: one missing required index
        // drops every live non-PK index and recreates the full desired set.
        let existing_indexes = self
            .dialect
            .indexes_of(table_name, executor.as_ref())
            .await?;
        let mut new_index_found = false;
        for index in table.indexes() {
            let required = compose_index_name(index, table_name);
            if !existing_indexes.contains(&required)
                && !existing_indexes.contains(&required.to_lowercase())
            {
                new_index_found = true;
                break;
            }
        }
        if new_index_found {
            self.drop_indexes(&existing_indexes, table).await?;
            self.create_indexes(table).await?;
        }

        // The PK is compared by constraint name only, never by its column
        // composition.
        let existing_pk = self
            .dialect
            .primary_key_name(table_name, executor.as_ref())
            .await?;
        let required_pk = compose_pk_name(table_name);
        if let Some(existing_pk) = existing_pk {
            if !required_pk.eq_ignore_ascii_case(&existing_pk) {
                self.drop_primary_key(&existing_pk, table_name).await?;
                self.create_primary_key(table).await?;
            }
        }

        Ok(())
    }

    async fn update_column(
        &self,
        table_name: &str,
        existing: &ColumnDescription,
        desired: &ColumnDescription,
    ) -> Result<()> {
        let column_type = desired.required_type()?;
        let required_type = self.dialect.metadata_type(column_type);
        let actual_type = existing.native_type().unwrap_or("");
        if !required_type.eq_ignore_ascii_case(actual_type) {
            error!(
                "Column type change [{} -> {}] is not supported within the scope of schema upgrade",
                actual_type, required_type
            );
            return Ok(());
        }

        let required_size = ddl::column_size(self.dialect, desired, table_name)?;
        let existing_size = existing.size().unwrap_or(0);

        let widen_size = if column_type.is_lob() {
            false
        } else {
            if required_size > 0 && required_size < existing_size {
                info!(
                    "size ({}->{}) decrease is not supported; column [{}]",
                    existing_size, required_size, desired
                );
            }
            required_size > existing_size
        };

        if existing.is_nullable() && !desired.is_nullable() {
            info!(
                "The constraint change (NULLABLE -> NOT NULLABLE) is unsupported; column [{}]",
                desired
            );
        }
        let loosen_nullability = !existing.is_nullable() && desired.is_nullable();

        let defaults_match = if column_type == ColumnType::Boolean {
            same_boolean_values(desired.default_value(), existing.default_value())
        } else {
            desired.default_value() == existing.default_value()
        };
        let default_change = if defaults_match {
            None
        } else {
            match desired.default_value() {
                Some(value) => Some(DefaultChange::Set(value.to_string())),
                None => Some(DefaultChange::Drop),
            }
        };

        let delta = ColumnDelta {
            widen_size,
            loosen_nullability,
            default_change,
        };
        if delta.is_empty() {
            return Ok(());
        }

        let clause = AlterClause {
            column_name: desired.name().to_string(),
            full_clause: ddl::compose_column_clause(
                self.dialect,
                table_name,
                desired,
                delta.widen_size,
                delta.loosen_nullability,
                delta.default_change.is_some(),
            )?,
            type_with_size: ddl::type_with_size(self.dialect, desired, table_name)?,
        };

        for sql in self
            .dialect
            .alter_column_statements(table_name, &delta, &clause)
        {
            self.execute(&sql).await?;
        }

        if delta.widen_size {
            info!(
                "Column [{}] size updated to {}",
                desired.name(),
                required_size
            );
        }
        if delta.loosen_nullability {
            info!("Column [{}] nullable constraint dropped", desired.name());
        }
        match &delta.default_change {
            Some(DefaultChange::Set(value)) => {
                info!("Column [{}] default value updated to {}", desired.name(), value);
            }
            Some(DefaultChange::Drop) => {
                info!("Column [{}] default value dropped", desired.name());
            }
            None => {}
        }

        Ok(())
    }

    async fn create_column(
        &self,
        table: &TableDescription,
        column: &ColumnDescription,
    ) -> Result<()> {
        let table_name = table.full_table_name();
        let column_sql = ddl::compose_full_column_clause(self.dialect, &table_name, column)?;
        let sql = self.dialect.add_column_statement(&table_name, &column_sql);
        info!("Creating column [{}] in table [{}]", column, table_name);
        self.execute(&sql).await?;

        self.set_compressed_storage(table, column).await
    }

    async fn drop_indexes(
        &self,
        existing_indexes: &HashSet<String>,
        table: &TableDescription,
    ) -> Result<()> {
        for index_name in existing_indexes {
            self.drop_index(index_name, table).await?;
        }
        Ok(())
    }

    async fn drop_index(&self, index_name: &str, table: &TableDescription) -> Result<()> {
        info!("Dropping index {}", index_name);
        if self.index_exists(index_name, table.table_name()).await? {
            let sql = format!("drop index {}", table.full_index_name(index_name));
            self.execute(&sql).await?;
        }
        Ok(())
    }

    async fn drop_primary_key(&self, pk_name: &str, table_name: &str) -> Result<()> {
        info!("Dropping constraint {}", pk_name);
        let sql = format!("alter table {table_name} drop constraint {pk_name}");
        self.execute(&sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_default_equivalence() {
        assert!(same_boolean_values(Some("true"), Some("1")));
        assert!(same_boolean_values(Some("t"), Some("TRUE")));
        assert!(same_boolean_values(None, Some("0")));
        assert!(same_boolean_values(Some("0"), Some("false")));
        assert!(!same_boolean_values(Some("1"), Some("0")));
        assert!(!same_boolean_values(Some("true"), None));
    }

    #[tokio::test]
    async fn missing_connection_source_is_fatal() {
        let reconciler = SchemaReconciler::new(DialectKind::Postgres);
        let result = reconciler.table_exists("TST_TABLE").await;
        assert!(matches!(result, Err(SchemaError::Config(_))));
    }

    #[tokio::test]
    async fn invalid_description_is_rejected_before_any_ddl() {
        // No executor configured: reaching the backend would fail with a
        // Config error, so a Description error proves validation ran first.
        let reconciler = SchemaReconciler::new(DialectKind::Postgres);
        let table = TableDescription::new("TST_TABLE")
            .with_column(ColumnDescription::new("A", ColumnType::Varchar))
            .with_column(ColumnDescription::new("B", ColumnType::Varchar))
            .with_index(IndexDescription::new(["A", "B"]).lower());
        let result = reconciler.create_table(&table).await;
        assert!(matches!(result, Err(SchemaError::Description(_))));
    }
}

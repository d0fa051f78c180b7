//! # schema-reconcile
//!
//! Declarative table-schema reconciliation for relational backends.
//!
//! Callers describe the desired shape of their tables — columns, primary key,
//! indexes, check constraints — and the reconciler converges the live backend
//! to that shape: it creates absent tables from scratch and, where the
//! backend supports introspection, diffs existing ones and issues the minimal
//! DDL (new columns, widened sizes, loosened nullability, default changes,
//! index and primary-key recreation). Reconciliation is stateless and
//! idempotent; there is no migration history and no rollback.
//!
//! ## Example
//!
//! ```rust,no_run
//! use schema_reconcile::{
//!     ColumnDescription, ColumnType, DialectKind, IndexDescription, ReconcilerConfig,
//!     SchemaReconciler, TableDescription,
//! };
//!
//! #[tokio::main]
//! async fn main() -> schema_reconcile::Result<()> {
//!     let config = ReconcilerConfig::load("reconcile.yaml")?;
//!     let reconciler = SchemaReconciler::from_config(&config)?;
//!
//!     let table = TableDescription::new("TST_TABLE")
//!         .with_column(ColumnDescription::new("ID", ColumnType::Id))
//!         .with_column(ColumnDescription::new("STR_COL", ColumnType::Varchar).with_size(20))
//!         .with_primary_key(IndexDescription::new(["ID"]))
//!         .with_index(IndexDescription::new(["STR_COL"]).lower());
//!
//!     reconciler.create_table(&table).await?;
//!     assert!(reconciler.table_exists("TST_TABLE").await?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod reconciler;

// Re-exports for convenient access
pub use crate::core::naming;
pub use crate::core::{
    ColumnDescription, ColumnType, IndexDescription, TableDescription, TableSource,
};
pub use config::{ConnectionConfig, ReconcilerConfig};
pub use dialect::{Dialect, DialectKind, H2Dialect, OracleDialect, PostgresDialect};
pub use error::{Result, SchemaError};
pub use executor::{
    ConnectionSource, PgConnectionSource, PgExecutor, ScalarValue, SqlExecutor, SqlRow,
};
pub use reconciler::SchemaReconciler;

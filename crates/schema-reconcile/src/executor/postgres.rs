//! PostgreSQL executor over a deadpool connection pool.

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::types::{Kind, ToSql, Type};
use tokio_postgres::{Config as PgConfig, NoTls, Row};
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::{Result, SchemaError};

use super::{ConnectionSource, ScalarValue, SqlExecutor, SqlRow};

/// PostgreSQL implementation of [`SqlExecutor`].
pub struct PgExecutor {
    pool: Pool,
}

impl PgExecutor {
    /// Connect to PostgreSQL and verify the connection.
    pub async fn new(config: &ConnectionConfig, max_conns: usize) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(max_conns)
            .build()
            .map_err(|e| SchemaError::pool(e, "creating PostgreSQL pool"))?;

        // Test connection
        let client = pool
            .get()
            .await
            .map_err(|e| SchemaError::pool(e, "testing PostgreSQL connection"))?;
        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to PostgreSQL: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self { pool })
    }

    fn convert_row(row: &Row) -> SqlRow {
        let mut converted = SqlRow::new();
        for (idx, column) in row.columns().iter().enumerate() {
            converted = converted.with(column.name(), Self::convert_value(row, idx));
        }
        converted
    }

    fn convert_value(row: &Row, idx: usize) -> ScalarValue {
        // information_schema columns are domains over base types; resolve to
        // the underlying type before matching.
        let mut ty = row.columns()[idx].type_();
        while let Kind::Domain(inner) = ty.kind() {
            ty = inner;
        }

        if *ty == Type::BOOL {
            match row.try_get::<_, Option<bool>>(idx) {
                Ok(Some(value)) => ScalarValue::Bool(value),
                _ => ScalarValue::Null,
            }
        } else if *ty == Type::INT2 {
            match row.try_get::<_, Option<i16>>(idx) {
                Ok(Some(value)) => ScalarValue::Int(i64::from(value)),
                _ => ScalarValue::Null,
            }
        } else if *ty == Type::INT4 {
            match row.try_get::<_, Option<i32>>(idx) {
                Ok(Some(value)) => ScalarValue::Int(i64::from(value)),
                _ => ScalarValue::Null,
            }
        } else if *ty == Type::INT8 {
            match row.try_get::<_, Option<i64>>(idx) {
                Ok(Some(value)) => ScalarValue::Int(value),
                _ => ScalarValue::Null,
            }
        } else {
            match row.try_get::<_, Option<String>>(idx) {
                Ok(Some(value)) => ScalarValue::Text(value),
                Ok(None) => ScalarValue::Null,
                Err(_) => {
                    debug!("unhandled catalog type {}, reading as NULL", ty);
                    ScalarValue::Null
                }
            }
        }
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn execute(&self, sql: &str) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| SchemaError::pool(e, "getting connection for execute"))?;

        debug!("executing: {}", sql);
        client.execute(sql, &[]).await?;
        Ok(())
    }

    async fn query_scalars(&self, sql: &str, params: &[&str]) -> Result<Vec<ScalarValue>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| SchemaError::pool(e, "getting connection for query"))?;

        let bind: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = client.query(sql, &bind).await?;

        Ok(rows.iter().map(|row| Self::convert_value(row, 0)).collect())
    }

    async fn query_rows(&self, sql: &str, params: &[&str]) -> Result<Vec<SqlRow>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| SchemaError::pool(e, "getting connection for query"))?;

        let bind: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = client.query(sql, &bind).await?;

        Ok(rows.iter().map(Self::convert_row).collect())
    }
}

/// Lazily builds a [`PgExecutor`] from connection settings.
pub struct PgConnectionSource {
    config: ConnectionConfig,
}

impl PgConnectionSource {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConnectionSource for PgConnectionSource {
    async fn connect(&self) -> Result<Arc<dyn SqlExecutor>> {
        // Reconciliation is single-writer and sequential; one connection.
        let executor = PgExecutor::new(&self.config, 1).await?;
        Ok(Arc::new(executor))
    }
}

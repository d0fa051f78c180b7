//! Configuration loading and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dialect::DialectKind;
use crate::error::{Result, SchemaError};

/// Root configuration: which backend family to reconcile against, and how to
/// reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Backend family (dialect selection).
    pub backend: DialectKind,

    /// Backend connection settings.
    pub connection: ConnectionConfig,
}

impl ReconcilerConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ReconcilerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,
}

fn default_port() -> u16 {
    5432
}

impl ConnectionConfig {
    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(SchemaError::Config("connection.host is required".to_string()));
        }
        if self.database.is_empty() {
            return Err(SchemaError::Config(
                "connection.database is required".to_string(),
            ));
        }
        if self.user.is_empty() {
            return Err(SchemaError::Config("connection.user is required".to_string()));
        }
        Ok(())
    }

    /// Build a connection string for tokio-postgres.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.database, self.user, self.password
        )
    }
}

//! Error types for schema reconciliation.

use thiserror::Error;

/// Main error type for reconciliation operations.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Configuration error (invalid YAML, missing fields, no connection source)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid declarative input (rejected before any DDL is issued)
    #[error("Invalid table description: {0}")]
    Description(String),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Backend connection or query error
    #[error("Backend error: {0}")]
    Backend(#[from] tokio_postgres::Error),

    /// A composed statement failed on the backend
    #[error("Statement failed on table {table}: {message}")]
    Statement { table: String, message: String },

    /// Capability not provided by the active dialect
    #[error("Operation not supported by the {dialect} dialect: {operation}")]
    Unsupported { dialect: String, operation: String },

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error (config file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        SchemaError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Statement error for a table
    pub fn statement(table: impl Into<String>, message: impl ToString) -> Self {
        SchemaError::Statement {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create an Unsupported error for a dialect capability gap
    pub fn unsupported(dialect: impl Into<String>, operation: impl Into<String>) -> Self {
        SchemaError::Unsupported {
            dialect: dialect.into(),
            operation: operation.into(),
        }
    }
}

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

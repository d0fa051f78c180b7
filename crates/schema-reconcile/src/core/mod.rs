//! Core abstractions: the declarative data model and the naming policy.
//!
//! - [`schema`]: table, column, and index descriptions
//! - [`naming`]: deterministic constraint and index identifiers

pub mod naming;
pub mod schema;

pub use schema::{ColumnDescription, ColumnType, IndexDescription, TableDescription, TableSource};

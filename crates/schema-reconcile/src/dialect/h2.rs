//! H2 dialect (creation only).
//!
//! H2 is the reduced-capability backend: tables, keys, and indexes can be
//! created, but the catalog introspection needed by the update path is not
//! provided, so reconciliation against H2 is a guarded no-op.

use crate::core::schema::ColumnType;

use super::{Dialect, DialectKind};

/// H2 dialect implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct H2Dialect;

impl Dialect for H2Dialect {
    fn kind(&self) -> DialectKind {
        DialectKind::H2
    }

    fn native_type(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            // H2 has a BOOLEAN type, but TINYINT keeps values numeric like
            // the other backends.
            ColumnType::Boolean => "TINYINT",
            ColumnType::Integer => "INT",
            ColumnType::Long | ColumnType::Id => "BIGINT",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Date => "DATE",
            ColumnType::Varbinary => "RAW",
            ColumnType::Varchar | ColumnType::UuidString => "VARCHAR",
            ColumnType::Blob => "BLOB",
            ColumnType::Clob => "CLOB",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    fn table_existence_query(&self) -> &'static str {
        "select 1 from information_schema.tables where table_name = ?"
    }

    fn index_existence_query(&self) -> &'static str {
        "select 1 from information_schema.indexes where index_name = ? and table_name = ?"
    }

    fn supports_reconciliation(&self) -> bool {
        false
    }

    fn pk_requires_index(&self) -> bool {
        true
    }

    fn add_column_statement(&self, _table_name: &str, _column_sql: &str) -> String {
        // Never reached: the update path is skipped for this backend.
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_map() {
        let dialect = H2Dialect;
        assert_eq!(dialect.native_type(ColumnType::Boolean), "TINYINT");
        assert_eq!(dialect.native_type(ColumnType::Integer), "INT");
        assert_eq!(dialect.native_type(ColumnType::Id), "BIGINT");
        assert_eq!(dialect.native_type(ColumnType::UuidString), "VARCHAR");
    }

    #[test]
    fn reconciliation_is_not_supported() {
        assert!(!H2Dialect.supports_reconciliation());
        assert!(H2Dialect.pk_requires_index());
    }
}

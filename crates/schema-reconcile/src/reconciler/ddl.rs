//! DDL composition.
//!
//! Column clause = `NAME [nativeType(size)] [DEFAULT literal] [NULL|NOT NULL]`
//! with each part conditionally included per call site: the full clause for
//! creation and addition, an arbitrary subset for alteration. Numeric
//! defaults are emitted unquoted; all other defaults are single-quoted.

use crate::core::schema::{ColumnDescription, ColumnType, IndexDescription, TableDescription};
use crate::dialect::Dialect;
use crate::error::Result;

const UUID_STR_COLUMN_SIZE: i32 = 37;

/// Size to emit for a column, or `0` for no size clause. Sizing policy is the
/// dialect's; `UUID_STRING` has a fixed width.
pub(crate) fn column_size(
    dialect: &dyn Dialect,
    column: &ColumnDescription,
    table_name: &str,
) -> Result<i32> {
    Ok(match column.required_type()? {
        ColumnType::Boolean => dialect.boolean_column_size(),
        ColumnType::Varbinary => dialect.varbinary_column_size(column.size()),
        ColumnType::Integer => dialect.integer_column_size(column.size()),
        ColumnType::Long | ColumnType::Id => dialect.long_column_size(column.size()),
        ColumnType::Varchar => {
            dialect.varchar_column_size(table_name, column.name(), column.size())
        }
        ColumnType::UuidString => UUID_STR_COLUMN_SIZE,
        _ => 0,
    })
}

/// Native type with the size suffix, e.g. `VARCHAR(30)` or `BIGINT`.
pub(crate) fn type_with_size(
    dialect: &dyn Dialect,
    column: &ColumnDescription,
    table_name: &str,
) -> Result<String> {
    let mut sql = dialect.native_type(column.required_type()?).to_string();
    let size = column_size(dialect, column, table_name)?;
    if size > 0 {
        sql.push_str(&format!("({size})"));
    }
    Ok(sql)
}

pub(crate) fn compose_column_clause(
    dialect: &dyn Dialect,
    table_name: &str,
    column: &ColumnDescription,
    use_size: bool,
    use_constraint: bool,
    use_default: bool,
) -> Result<String> {
    let mut sql = column.name().to_string();

    if use_size {
        sql.push(' ');
        sql.push_str(&type_with_size(dialect, column, table_name)?);
    }

    if use_default {
        let default_value = column.default_value();
        if column.required_type()?.is_numeric_default() {
            sql.push_str(" DEFAULT ");
            sql.push_str(default_value.unwrap_or("null"));
        } else {
            match default_value {
                Some(value) => sql.push_str(&format!(" DEFAULT '{value}'")),
                None => sql.push_str(" DEFAULT null"),
            }
        }
    }

    if use_constraint {
        sql.push_str(if column.is_nullable() { " null" } else { " not null" });
    }

    Ok(sql)
}

/// Full clause for creation/addition; the default part is included only when
/// a non-empty default is declared.
pub(crate) fn compose_full_column_clause(
    dialect: &dyn Dialect,
    table_name: &str,
    column: &ColumnDescription,
) -> Result<String> {
    let use_default = column.default_value().is_some_and(|value| !value.is_empty());
    compose_column_clause(dialect, table_name, column, true, true, use_default)
}

pub(crate) fn compose_table_creation_sql(
    dialect: &dyn Dialect,
    table: &TableDescription,
) -> Result<String> {
    let full_table_name = table.full_table_name();
    let mut sql = format!("create table {full_table_name} (");

    let mut comma = "";
    for column in table.columns().values() {
        sql.push_str(comma);
        sql.push_str(&compose_full_column_clause(dialect, &full_table_name, column)?);
        comma = ", ";
    }

    dialect.append_check_constraints(table, &mut sql, comma);
    sql.push(')');

    if table.inherits() {
        if let Some(parent) = table.parent_table_name() {
            if let Some(clause) = dialect.table_inheritance_clause(parent) {
                sql.push_str(&clause);
            }
        }
    }

    Ok(sql)
}

pub(crate) fn compose_index_creation_sql(
    dialect: &dyn Dialect,
    index: &IndexDescription,
    index_name: &str,
    table_name: &str,
) -> String {
    let mut sql = String::from("create ");
    if index.is_unique() {
        sql.push_str("unique ");
    }
    sql.push_str("index ");
    sql.push_str(index_name);
    sql.push_str(" on ");
    sql.push_str(table_name);

    if index.is_lower() {
        // Validation rejects composite lower indexes before this point.
        if let Some(column) = index.column_names().first() {
            sql.push(' ');
            sql.push_str(&dialect.lower_index_expression(column));
        }
    } else {
        sql.push_str(" (");
        sql.push_str(&index.column_names().join(", "));
        sql.push(')');
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{DialectKind, OracleDialect, PostgresDialect};

    #[test]
    fn full_clause_on_postgres() {
        let dialect = DialectKind::Postgres.dialect();

        let column = ColumnDescription::new("STR_COL", ColumnType::Varchar)
            .with_size(20)
            .not_nullable();
        assert_eq!(
            compose_full_column_clause(dialect, "TST_TABLE", &column).unwrap(),
            "STR_COL VARCHAR(20) not null"
        );

        let with_default = ColumnDescription::new("STR1_COL", ColumnType::Varchar)
            .with_default("Chupacabra");
        assert_eq!(
            compose_full_column_clause(dialect, "TST_TABLE", &with_default).unwrap(),
            "STR1_COL VARCHAR(50) DEFAULT 'Chupacabra' null"
        );
    }

    #[test]
    fn numeric_defaults_are_unquoted() {
        let dialect = &OracleDialect;
        let column = ColumnDescription::new("INT_COL", ColumnType::Integer)
            .with_size(5)
            .with_default("7");
        assert_eq!(
            compose_full_column_clause(dialect, "TST_TABLE", &column).unwrap(),
            "INT_COL NUMBER(2) DEFAULT 7 null"
        );
    }

    #[test]
    fn boolean_on_postgres_has_no_size_and_quoted_default() {
        let dialect = &PostgresDialect;
        let column = ColumnDescription::new("BOOL_COL", ColumnType::Boolean);
        assert_eq!(
            compose_full_column_clause(dialect, "TST_TABLE", &column).unwrap(),
            "BOOL_COL BOOLEAN DEFAULT '0' not null"
        );
    }

    #[test]
    fn uuid_columns_have_a_fixed_width() {
        let dialect = &OracleDialect;
        let column = ColumnDescription::new("GUID", ColumnType::UuidString);
        assert_eq!(
            compose_full_column_clause(dialect, "TST_TABLE", &column).unwrap(),
            "GUID VARCHAR2(37) not null"
        );
    }

    #[test]
    fn lob_columns_have_no_size() {
        let dialect = &OracleDialect;
        let column = ColumnDescription::new("PAYLOAD", ColumnType::Blob);
        assert_eq!(
            compose_full_column_clause(dialect, "TST_TABLE", &column).unwrap(),
            "PAYLOAD BLOB null"
        );
    }

    #[test]
    fn create_table_with_checks_on_postgres() {
        let dialect = &PostgresDialect;
        let table = TableDescription::new("TST_TABLE")
            .with_column(ColumnDescription::new("INT_COL", ColumnType::Integer))
            .with_check("INT_COL > 0");
        assert_eq!(
            compose_table_creation_sql(dialect, &table).unwrap(),
            "create table TST_TABLE (INT_COL INTEGER null, check (INT_COL > 0))"
        );
    }

    #[test]
    fn inheriting_table_has_no_columns_and_an_inherits_clause() {
        let dialect = &PostgresDialect;
        let table = TableDescription::new("CHILD_TABLE").inherits_from("PARENT_TABLE");
        assert_eq!(
            compose_table_creation_sql(dialect, &table).unwrap(),
            "create table CHILD_TABLE () inherits (PARENT_TABLE)"
        );
    }

    #[test]
    fn inherits_clause_is_postgres_only() {
        let dialect = &OracleDialect;
        let table = TableDescription::new("CHILD_TABLE").inherits_from("PARENT_TABLE");
        assert_eq!(
            compose_table_creation_sql(dialect, &table).unwrap(),
            "create table CHILD_TABLE ()"
        );
    }

    #[test]
    fn index_creation_sql() {
        let dialect = &PostgresDialect;
        let index = IndexDescription::new(["INT_COL", "STR_COL"]);
        assert_eq!(
            compose_index_creation_sql(dialect, &index, "IX1_TST_TABLE_INT_COL_STR_COL", "TST_TABLE"),
            "create index IX1_TST_TABLE_INT_COL_STR_COL on TST_TABLE (INT_COL, STR_COL)"
        );

        let unique_lower = IndexDescription::new(["STR_COL"]).unique().lower();
        assert_eq!(
            compose_index_creation_sql(dialect, &unique_lower, "UIX1_TST_TABLE_STR_COL_LOWER", "TST_TABLE"),
            "create unique index UIX1_TST_TABLE_STR_COL_LOWER on TST_TABLE ((lower(STR_COL)))"
        );
    }

    #[test]
    fn lower_index_on_oracle() {
        let dialect = &OracleDialect;
        let index = IndexDescription::new(["STR_COL"]).lower();
        assert_eq!(
            compose_index_creation_sql(dialect, &index, "IX1_TST_TABLE_STR_COL_LOWER", "TST_TABLE"),
            "create index IX1_TST_TABLE_STR_COL_LOWER on TST_TABLE lower(STR_COL)"
        );
    }
}

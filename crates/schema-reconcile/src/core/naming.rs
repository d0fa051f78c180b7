//! Deterministic derivation of constraint and index identifiers.
//!
//! Names are purely structural: the primary-key name depends on the table
//! name alone, and index names are built from the table name, the key columns
//! in order, and the index flags. No live-collision detection happens here.

use super::schema::IndexDescription;

const PRIMARY_KEY_PREFIX: &str = "PK_";
const INDEX_PREFIX: &str = "IX1_";
const UNIQUE_INDEX_PREFIX: &str = "UIX1_";

/// Primary-key constraint name for a table, independent of which columns
/// compose the key.
pub fn compose_pk_name(table_name: &str) -> String {
    format!("{PRIMARY_KEY_PREFIX}{table_name}")
}

/// Index name: prefix + table + `_` + each column in key order, with a
/// `_LOWER` suffix for lower-expression indexes; upper-cased as a whole.
pub fn compose_index_name(index: &IndexDescription, table_name: &str) -> String {
    let prefix = if index.is_unique() {
        UNIQUE_INDEX_PREFIX
    } else {
        INDEX_PREFIX
    };

    let mut name = format!("{prefix}{table_name}");
    for column_name in index.column_names() {
        name.push('_');
        name.push_str(column_name);
    }
    if index.is_lower() {
        name.push_str("_LOWER");
    }

    name.to_uppercase()
}

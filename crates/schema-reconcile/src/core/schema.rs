//! Declarative schema metadata for tables, columns, and indexes.
//!
//! These types are pure values: callers build them up front (directly or
//! through a [`TableSource`]) and hand them to the reconciler, which never
//! mutates them. Columns read back from a live backend are materialized as
//! new instances carrying only the observed facts.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Result, SchemaError};

/// Abstract column types understood by every dialect.
///
/// `Id` and `UuidString` are surrogate-key types; assigning either forces the
/// column not-nullable. `Boolean` also forces not-nullable and installs a
/// default of `"0"` when no explicit default was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    Date,
    Varchar,
    Varbinary,
    Clob,
    Blob,
    Timestamp,
    UuidString,
    Id,
}

impl ColumnType {
    /// Large-object types never carry a size clause.
    pub fn is_lob(self) -> bool {
        matches!(self, ColumnType::Blob | ColumnType::Clob)
    }

    /// Types whose default literals are emitted unquoted.
    pub fn is_numeric_default(self) -> bool {
        matches!(self, ColumnType::Long | ColumnType::Integer)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single column of a desired (or introspected) table.
///
/// Identity is `name + type + size + nullable + default`; the discovered
/// native type and the compressed-storage flag are observational and excluded
/// from equality.
#[derive(Debug, Clone)]
pub struct ColumnDescription {
    name: String,
    column_type: Option<ColumnType>,
    size: Option<i32>,
    nullable: bool,
    default_value: Option<String>,
    native_type: Option<String>,
    compressed: bool,
}

impl ColumnDescription {
    /// Create a declared column of the given type.
    ///
    /// The name is upper-cased (column identity is case-insensitive) and the
    /// type constraints described on [`ColumnType`] are applied immediately.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        let mut column = Self {
            name: name.into().to_uppercase(),
            column_type: Some(column_type),
            size: None,
            nullable: true,
            default_value: None,
            native_type: None,
            compressed: false,
        };

        match column_type {
            ColumnType::Boolean => {
                column.size = Some(1);
                column.nullable = false;
                column.default_value = Some("0".to_string());
            }
            ColumnType::Id | ColumnType::UuidString => {
                column.nullable = false;
            }
            _ => {}
        }

        column
    }

    /// Create an introspected column carrying only live facts (no abstract
    /// type). Used by dialect introspection, never by callers.
    pub fn introspected(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_uppercase(),
            column_type: None,
            size: None,
            nullable: true,
            default_value: None,
            native_type: None,
            compressed: false,
        }
    }

    /// Set an explicit size (absent means "dialect default").
    pub fn with_size(mut self, size: i32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn not_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn set_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set a default value literal; backend-specific quoting is resolved at
    /// DDL-composition time.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Remove the default value (including a type-installed one).
    pub fn without_default(mut self) -> Self {
        self.default_value = None;
        self
    }

    /// Record the native type reported by a live backend.
    pub fn with_native_type(mut self, native_type: impl Into<String>) -> Self {
        self.native_type = Some(native_type.into());
        self
    }

    /// Record a live default value (or absence of one).
    pub fn with_live_default(mut self, default_value: Option<String>) -> Self {
        self.default_value = default_value;
        self
    }

    /// Request compressed storage for this column (a creation-time hint;
    /// not part of column identity).
    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> Option<ColumnType> {
        self.column_type
    }

    /// The declared type, or a `Description` error for a column that was
    /// read back from a live backend and never declared one.
    pub fn required_type(&self) -> Result<ColumnType> {
        self.column_type.ok_or_else(|| {
            SchemaError::Description(format!("column {} has no declared type", self.name))
        })
    }

    pub fn size(&self) -> Option<i32> {
        self.size
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn native_type(&self) -> Option<&str> {
        self.native_type.as_deref()
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

impl PartialEq for ColumnDescription {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.column_type == other.column_type
            && self.size == other.size
            && self.nullable == other.nullable
            && self.default_value == other.default_value
    }
}

impl Eq for ColumnDescription {}

impl fmt::Display for ColumnDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name = {}, type = {:?}, nativeType = {:?}, size = {:?}, nullable = {}, default = {:?}",
            self.name, self.column_type, self.native_type, self.size, self.nullable, self.default_value
        )
    }
}

/// An index over one or more columns; column order defines the key order.
///
/// The `lower` flag requests an expression index over `lower(column)` and is
/// only valid for a single-column index; validation rejects the combination
/// before any DDL is composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescription {
    column_names: Vec<String>,
    unique: bool,
    lower: bool,
}

impl IndexDescription {
    pub fn new<I, S>(column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column_names: column_names.into_iter().map(Into::into).collect(),
            unique: false,
            lower: false,
        }
    }

    /// Append a column to the key.
    pub fn and_column(mut self, column_name: impl Into<String>) -> Self {
        self.column_names.push(column_name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Index over `lower(column)`; single-column indexes only.
    pub fn lower(mut self) -> Self {
        self.lower = true;
        self
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_lower(&self) -> bool {
        self.lower
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.column_names.is_empty() {
            return Err(SchemaError::Description(
                "index must reference at least one column".to_string(),
            ));
        }
        if self.lower && self.column_names.len() != 1 {
            return Err(SchemaError::Description(format!(
                "lower flag is not allowed on a composite index [{self}]"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for IndexDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.column_names)?;
        if self.unique {
            write!(f, "; unique")?;
        }
        if self.lower {
            write!(f, "; lower")?;
        }
        Ok(())
    }
}

/// The desired shape of one table: columns in declaration order, at most one
/// primary key, secondary indexes, check expressions, and child join tables
/// created as siblings after the owning table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    table_name: String,
    schema: Option<String>,
    columns: IndexMap<String, ColumnDescription>,
    primary_key: Option<IndexDescription>,
    indexes: Vec<IndexDescription>,
    checks: Vec<String>,
    join_tables: Vec<TableDescription>,
    parent_table_name: Option<String>,
}

impl TableDescription {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            schema: None,
            columns: IndexMap::new(),
            primary_key: None,
            indexes: Vec::new(),
            checks: Vec::new(),
            join_tables: Vec::new(),
            parent_table_name: None,
        }
    }

    /// Qualify the table with a schema; prefixes table and index names in
    /// every composed statement.
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add a column. A column with the same (upper-cased) name replaces the
    /// earlier declaration.
    pub fn with_column(mut self, column: ColumnDescription) -> Self {
        self.columns.insert(column.name().to_string(), column);
        self
    }

    /// Set the primary key; the index is forced unique.
    pub fn with_primary_key(mut self, primary_key: IndexDescription) -> Self {
        self.primary_key = Some(primary_key.unique());
        self
    }

    pub fn with_index(mut self, index: IndexDescription) -> Self {
        self.indexes.push(index);
        self
    }

    /// Add a check-constraint expression (dialect support permitting).
    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.checks.push(check.into());
        self
    }

    /// Attach a join-table description, created independently after this
    /// table.
    pub fn with_join_table(mut self, join_table: TableDescription) -> Self {
        self.join_tables.push(join_table);
        self
    }

    /// Declare table inheritance. An inheriting table carries no own columns;
    /// any columns declared so far are discarded.
    pub fn inherits_from(mut self, parent_table_name: impl Into<String>) -> Self {
        self.parent_table_name = Some(parent_table_name.into());
        self.columns = IndexMap::new();
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    fn schema_prefix(&self) -> String {
        match &self.schema {
            Some(schema) if !schema.is_empty() => format!("{schema}."),
            _ => String::new(),
        }
    }

    /// Schema-qualified table name as used in DDL.
    pub fn full_table_name(&self) -> String {
        format!("{}{}", self.schema_prefix(), self.table_name)
    }

    /// Schema-qualified index name as used in `drop index`.
    pub fn full_index_name(&self, index_name: &str) -> String {
        format!("{}{}", self.schema_prefix(), index_name)
    }

    pub fn columns(&self) -> &IndexMap<String, ColumnDescription> {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescription> {
        self.columns.get(&name.to_uppercase())
    }

    pub fn primary_key(&self) -> Option<&IndexDescription> {
        self.primary_key.as_ref()
    }

    pub fn indexes(&self) -> &[IndexDescription] {
        &self.indexes
    }

    pub fn checks(&self) -> &[String] {
        &self.checks
    }

    pub fn join_tables(&self) -> &[TableDescription] {
        &self.join_tables
    }

    pub fn parent_table_name(&self) -> Option<&str> {
        self.parent_table_name.as_deref()
    }

    pub fn inherits(&self) -> bool {
        matches!(&self.parent_table_name, Some(parent) if !parent.is_empty())
    }

    /// Validate the declarative invariants before any DDL is composed.
    ///
    /// Rejects inheriting tables that declare their own columns, columns
    /// without a type, empty or illegal (composite lower) indexes, and
    /// recurses into join tables.
    pub fn validate(&self) -> Result<()> {
        if self.inherits() && !self.columns.is_empty() {
            return Err(SchemaError::Description(format!(
                "table {} inherits from {:?} and must not declare its own columns",
                self.table_name, self.parent_table_name
            )));
        }

        for column in self.columns.values() {
            column.required_type()?;
        }

        if let Some(pk) = &self.primary_key {
            pk.validate()?;
        }
        for index in &self.indexes {
            index.validate()?;
        }

        for join_table in &self.join_tables {
            join_table.validate()?;
        }

        Ok(())
    }
}

impl fmt::Display for TableDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {}", self.table_name)
    }
}

/// Anything that can supply the desired description of one table.
///
/// The reconciler consumes already-built [`TableDescription`] values; this
/// trait is the seam through which an external metadata provider hands them
/// over.
pub trait TableSource {
    fn table_description(&self) -> TableDescription;
}

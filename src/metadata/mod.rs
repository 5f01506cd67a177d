//! Database metadata model and sources.
//!
//! This module provides:
//! - Data models for tables, columns, primary keys, and foreign keys
//! - Qualified table name collapsing for conventional default schemas
//! - Display-type derivation for column rendering
//! - The `MetadataSource` trait and its PostgreSQL implementation

mod postgres;

pub use postgres::PostgresSource;

use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use std::fmt;
use std::str::FromStr;

/// Schemas whose tables are displayed without a schema qualifier
pub const DEFAULT_SCHEMAS: [&str; 2] = ["dbo", "public"];

/// Sentinel reported by metadata sources for unbounded character lengths
const UNBOUNDED_LENGTH: i32 = -1;

/// Canonical table name: `schema.table`, collapsed to bare `table` for the
/// conventional default schemas.
pub fn qualified_table_name(schema: &str, table: &str) -> String {
    if DEFAULT_SCHEMAS.contains(&schema) {
        table.to_string()
    } else {
        format!("{}.{}", schema, table)
    }
}

/// Supported database engine types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Postgres,
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DatabaseType::Postgres),
            _ => Err(format!(
                "Unknown database type: {}. Valid options: postgres",
                s
            )),
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::Postgres => write!(f, "postgres"),
        }
    }
}

/// Column definition within a table
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Raw database type name
    pub raw_type: String,
    /// Type string shown in diagrams, derived once at construction
    pub display_type: String,
    /// Whether this column allows NULL values
    pub nullable: bool,
    /// Character length, `-1` for unbounded
    pub char_length: Option<i32>,
    /// Numeric precision
    pub precision: Option<i32>,
    /// Numeric scale
    pub scale: Option<i32>,
}

impl Column {
    pub fn new(
        name: String,
        raw_type: String,
        nullable: bool,
        char_length: Option<i32>,
        precision: Option<i32>,
        scale: Option<i32>,
    ) -> Self {
        let display_type = display_type(&raw_type, char_length, precision, scale);
        Self {
            name,
            raw_type,
            display_type,
            nullable,
            char_length,
            precision,
            scale,
        }
    }
}

/// Derive the type string shown next to a column.
///
/// Character types carry their length, `(max)` for the unbounded sentinel.
/// Numeric types carry `(precision, scale)`, except the integer family whose
/// precision is implied by the type name.
fn display_type(
    raw_type: &str,
    char_length: Option<i32>,
    precision: Option<i32>,
    scale: Option<i32>,
) -> String {
    let mut result = raw_type.to_lowercase();

    if let Some(length) = char_length {
        if length == UNBOUNDED_LENGTH {
            result.push_str("(max)");
        } else {
            result.push_str(&format!("({})", length));
        }
    } else if let Some(precision) = precision {
        if !result.contains("int") {
            result.push_str(&format!("({}, {})", precision, scale.unwrap_or(0)));
        }
    }

    result
}

/// A foreign-key reference from a child table/column to a parent table/column.
///
/// One value per constraint-column pair; composite keys produce one reference
/// per column position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Child table holding the constraint
    pub table: String,
    /// Child column
    pub column: String,
    /// Referenced parent table
    pub pk_table: String,
    /// Referenced parent column
    pub pk_column: String,
}

/// One consistent view of a database's structure, read once per run and held
/// immutably thereafter.
#[derive(Debug, Default)]
pub struct SchemaSnapshot {
    /// Canonical table names, ordered by schema then table name
    pub tables: Vec<String>,
    /// Columns per table, in ordinal position order
    pub columns: AHashMap<String, Vec<Column>>,
    /// Primary-key column names per table
    pub primary_keys: AHashMap<String, AHashSet<String>>,
    /// Foreign-key references in source query order
    pub foreign_keys: Vec<ForeignKey>,
}

impl SchemaSnapshot {
    /// Number of tables in the snapshot
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the snapshot holds no tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Check whether a column is a primary-key member of the given table
    pub fn is_pk_member(&self, table: &str, column: &str) -> bool {
        self.primary_keys
            .get(table)
            .map_or(false, |pk| pk.contains(column))
    }
}

/// A source of schema metadata, typically a live database connection.
///
/// The four listings mirror the shape of the fixed metadata queries: ordered
/// table names, columns keyed by table, primary-key sets keyed by table, and
/// a flat foreign-key list whose order must be preserved.
pub trait MetadataSource {
    /// List canonical table names, ordered by schema then table name.
    fn list_tables(&mut self) -> Result<Vec<String>>;

    /// List columns per table, ordered by ordinal position.
    fn list_columns(&mut self) -> Result<AHashMap<String, Vec<Column>>>;

    /// List primary-key column names per table.
    fn list_primary_keys(&mut self) -> Result<AHashMap<String, AHashSet<String>>>;

    /// List foreign-key references in constraint order.
    fn list_foreign_keys(&mut self) -> Result<Vec<ForeignKey>>;

    /// Read all four metadata collections into one immutable snapshot.
    ///
    /// `progress` is called with a short stage description before each read.
    fn snapshot(&mut self, mut progress: impl FnMut(&str)) -> Result<SchemaSnapshot>
    where
        Self: Sized,
    {
        progress("reading tables");
        let tables = self.list_tables()?;
        progress("reading columns");
        let columns = self.list_columns()?;
        progress("reading primary keys");
        let primary_keys = self.list_primary_keys()?;
        progress("reading foreign keys");
        let foreign_keys = self.list_foreign_keys()?;

        Ok(SchemaSnapshot {
            tables,
            columns,
            primary_keys,
            foreign_keys,
        })
    }
}

//! PostgreSQL metadata source backed by `information_schema`.
//!
//! All four queries cast identifier and length columns to plain `text`/`int4`
//! so the driver does not have to deal with the `information_schema` domain
//! types.

use super::{qualified_table_name, Column, ForeignKey, MetadataSource};
use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use postgres::{Client, NoTls};

const LIST_TABLES_SQL: &str = "
SELECT table_schema::text, table_name::text
FROM information_schema.tables
WHERE table_type = 'BASE TABLE'
  AND table_name NOT IN ('dtproperties', 'sysdiagrams')
  AND table_schema NOT IN ('information_schema', 'pg_catalog')
ORDER BY table_schema, table_name
";

const LIST_COLUMNS_SQL: &str = "
SELECT table_schema::text,
  table_name::text,
  column_name::text,
  is_nullable::text,
  data_type::text,
  character_maximum_length::int4,
  numeric_precision::int4,
  numeric_scale::int4
FROM information_schema.columns
ORDER BY table_schema, table_name, ordinal_position
";

const LIST_PRIMARY_KEYS_SQL: &str = "
SELECT u.table_schema::text, u.table_name::text, u.column_name::text
FROM information_schema.constraint_column_usage u
JOIN information_schema.table_constraints c
  ON  c.constraint_name = u.constraint_name
  AND c.constraint_schema = u.constraint_schema
WHERE c.constraint_type = 'PRIMARY KEY'
";

// One row per constraint-column pair; composite keys are matched up by
// ordinal position on both sides of the constraint.
const LIST_FOREIGN_KEYS_SQL: &str = "
SELECT kcu1.table_schema::text AS table_schema,
  kcu1.table_name::text AS table_name,
  kcu1.column_name::text AS column_name,
  kcu2.table_schema::text AS pk_table_schema,
  kcu2.table_name::text AS pk_table_name,
  kcu2.column_name::text AS pk_column_name
FROM information_schema.referential_constraints rc
JOIN information_schema.key_column_usage kcu1
  ON  kcu1.constraint_catalog = rc.constraint_catalog
  AND kcu1.constraint_schema = rc.constraint_schema
  AND kcu1.constraint_name = rc.constraint_name
JOIN information_schema.key_column_usage kcu2
  ON  kcu2.constraint_catalog = rc.unique_constraint_catalog
  AND kcu2.constraint_schema = rc.unique_constraint_schema
  AND kcu2.constraint_name = rc.unique_constraint_name
WHERE kcu1.ordinal_position = kcu2.ordinal_position
  AND kcu1.table_schema NOT IN ('sys', 'guest', 'information_schema')
ORDER BY kcu1.constraint_schema, kcu1.constraint_name
";

/// Metadata source reading a live PostgreSQL database over a blocking client.
pub struct PostgresSource {
    client: Client,
}

impl PostgresSource {
    /// Connect to the given database. Fails when the server is unreachable or
    /// the credentials are rejected; nothing is read until the first listing.
    pub fn connect(host: &str, database: &str, user: &str, password: &str) -> Result<Self> {
        let client = postgres::Config::new()
            .host(host)
            .dbname(database)
            .user(user)
            .password(password)
            .connect(NoTls)
            .with_context(|| format!("error connecting to database {} on {}", database, host))?;

        Ok(Self { client })
    }
}

impl MetadataSource for PostgresSource {
    fn list_tables(&mut self) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(LIST_TABLES_SQL, &[])
            .context("error reading tables")?;

        Ok(rows
            .iter()
            .map(|row| qualified_table_name(row.get("table_schema"), row.get("table_name")))
            .collect())
    }

    fn list_columns(&mut self) -> Result<AHashMap<String, Vec<Column>>> {
        let rows = self
            .client
            .query(LIST_COLUMNS_SQL, &[])
            .context("error reading columns")?;

        let mut result: AHashMap<String, Vec<Column>> = AHashMap::new();
        for row in &rows {
            let table = qualified_table_name(row.get("table_schema"), row.get("table_name"));
            let nullable: &str = row.get("is_nullable");

            result.entry(table).or_default().push(Column::new(
                row.get("column_name"),
                row.get("data_type"),
                nullable == "YES",
                row.get("character_maximum_length"),
                row.get("numeric_precision"),
                row.get("numeric_scale"),
            ));
        }

        Ok(result)
    }

    fn list_primary_keys(&mut self) -> Result<AHashMap<String, AHashSet<String>>> {
        let rows = self
            .client
            .query(LIST_PRIMARY_KEYS_SQL, &[])
            .context("error reading primary keys")?;

        let mut result: AHashMap<String, AHashSet<String>> = AHashMap::new();
        for row in &rows {
            let table = qualified_table_name(row.get("table_schema"), row.get("table_name"));
            result
                .entry(table)
                .or_default()
                .insert(row.get("column_name"));
        }

        Ok(result)
    }

    fn list_foreign_keys(&mut self) -> Result<Vec<ForeignKey>> {
        let rows = self
            .client
            .query(LIST_FOREIGN_KEYS_SQL, &[])
            .context("error reading foreign keys")?;

        Ok(rows
            .iter()
            .map(|row| ForeignKey {
                table: qualified_table_name(row.get("table_schema"), row.get("table_name")),
                column: row.get("column_name"),
                pk_table: qualified_table_name(
                    row.get("pk_table_schema"),
                    row.get("pk_table_name"),
                ),
                pk_column: row.get("pk_column_name"),
            })
            .collect())
    }
}

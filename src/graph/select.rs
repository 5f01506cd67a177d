//! Table selection for graph output.

use crate::metadata::ForeignKey;
use ahash::AHashSet;

/// Relationship-expansion depth around the initially selected tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expansion {
    /// Only the tables matched by the filter
    #[default]
    None,
    /// Add tables one foreign-key hop away
    First,
    /// Add tables up to two foreign-key hops away
    Second,
}

impl Expansion {
    /// Build from the two CLI flags; second-degree implies first-degree.
    pub fn from_flags(first: bool, second: bool) -> Self {
        if second {
            Expansion::Second
        } else if first {
            Expansion::First
        } else {
            Expansion::None
        }
    }

    fn hops(self) -> usize {
        match self {
            Expansion::None => 0,
            Expansion::First => 1,
            Expansion::Second => 2,
        }
    }
}

/// Which tables to include in the rendered graph.
///
/// Schema and table names are matched case-insensitively; both lists are
/// lowercased on construction.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    schemas: Vec<String>,
    tables: Vec<String>,
    expansion: Expansion,
}

impl TableFilter {
    pub fn new(schemas: Vec<String>, tables: Vec<String>, expansion: Expansion) -> Self {
        Self {
            schemas: schemas.into_iter().map(|s| s.to_lowercase()).collect(),
            tables: tables.into_iter().map(|t| t.to_lowercase()).collect(),
            expansion,
        }
    }

    /// No schema or table constraints: every table is selected.
    fn is_unconstrained(&self) -> bool {
        self.schemas.is_empty() && self.tables.is_empty()
    }
}

/// Resolve a filter into the final set of tables to render.
///
/// When several schemas or table names are requested, each iteration
/// re-assigns the result instead of accumulating, so only the last entry's
/// matches survive as the base set before expansion. Existing diagrams depend
/// on this; keep it when touching the loops below.
///
/// The returned set carries no order; callers iterate the snapshot's table
/// list restricted to it.
pub fn select(
    tables: &[String],
    foreign_keys: &[ForeignKey],
    filter: &TableFilter,
) -> AHashSet<String> {
    if filter.is_unconstrained() {
        return tables.iter().cloned().collect();
    }

    let mut result: Vec<String> = Vec::new();

    for schema in &filter.schemas {
        let prefix = format!("{}.", schema);
        result = tables
            .iter()
            .filter(|t| t.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect();
    }

    for name in &filter.tables {
        result = tables
            .iter()
            .filter(|t| t.to_lowercase() == *name)
            .cloned()
            .collect();
    }

    let mut selected: AHashSet<String> = result.into_iter().collect();
    for _ in 0..filter.expansion.hops() {
        selected = expand(&selected, foreign_keys);
    }

    selected
}

/// One expansion hop: add every table joined to the current selection by a
/// foreign key, in either direction.
fn expand(selected: &AHashSet<String>, foreign_keys: &[ForeignKey]) -> AHashSet<String> {
    let mut result = selected.clone();

    for table in selected {
        for fk in foreign_keys {
            if fk.table.eq_ignore_ascii_case(table) {
                result.insert(fk.pk_table.clone());
            }
            if fk.pk_table.eq_ignore_ascii_case(table) {
                result.insert(fk.table.clone());
            }
        }
    }

    result
}

//! GraphViz DOT output for database relationship diagrams.

use crate::metadata::{ForeignKey, SchemaSnapshot};
use ahash::AHashSet;

/// How much detail to render for each table node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Full column detail with per-column ports
    #[default]
    Columns,
    /// Table names only
    NamesOnly,
}

/// Render the selected tables and their foreign keys as a DOT document.
///
/// Tables are emitted in snapshot order restricted to `selected`, and edges in
/// foreign-key source order without deduplication, so the same inputs always
/// produce byte-identical output. An empty selection yields a valid graph
/// with no nodes.
pub fn to_dot(snapshot: &SchemaSnapshot, selected: &AHashSet<String>, mode: RenderMode) -> String {
    match mode {
        RenderMode::Columns => render_with_columns(snapshot, selected),
        RenderMode::NamesOnly => render_names_only(snapshot, selected),
    }
}

fn render_with_columns(snapshot: &SchemaSnapshot, selected: &AHashSet<String>) -> String {
    let mut output = String::new();

    output.push_str("digraph database_schema {\n");
    output.push_str("    rankdir=RL;\n");
    output.push_str("    node [shape=plaintext]\n");
    output.push_str("    splines=compound\n\n");

    for table in selected_in_order(snapshot, selected) {
        output.push_str(&format!("    {}[label=<\n", node_id(table)));
        output.push_str("<TABLE BORDER='0' CELLBORDER='1' CELLSPACING='0'>\n");
        output.push_str(&format!(
            "    <tr><td colspan='2' bgcolor='lightgray'>{}</td></tr>\n",
            table
        ));

        // A table without a columns entry still gets its header row
        for column in snapshot.columns.get(table).map_or(&[][..], Vec::as_slice) {
            let name = if snapshot.is_pk_member(table, &column.name) {
                format!("<font color='blue'>{}</font>", column.name)
            } else {
                column.name.clone()
            };

            let display_type = if column.nullable {
                format!("<font color='#C7B097'>{}</font>", column.display_type)
            } else {
                column.display_type.clone()
            };

            let port = column.name.replace('.', "_");
            output.push_str(&format!(
                "    <tr><td port='{port}' align='left'>{name}</td><td port='{port}_to' align='left'>{display_type}</td></tr>\n"
            ));
        }

        output.push_str("</TABLE>\n");
        output.push_str("    >];\n\n");
    }

    output.push_str("    node [shape=recorder style=filled fillcolor=lightgray]\n\n");

    for fk in selected_edges(snapshot, selected) {
        output.push_str(&format!(
            "    {}:{} -> {}:{}_TO[arrowhead=normal arrowtail=tee dir=both]\n",
            node_id(&fk.table),
            fk.column,
            node_id(&fk.pk_table),
            fk.pk_column
        ));
    }

    output.push_str("}\n");
    output
}

fn render_names_only(snapshot: &SchemaSnapshot, selected: &AHashSet<String>) -> String {
    let mut output = String::new();

    output.push_str("digraph database_schema {\n");
    output.push_str("    rankdir=RL;\n");
    output.push_str("    node [shape=block]\n");
    output.push_str("    splines=compound\n\n");

    for table in selected_in_order(snapshot, selected) {
        output.push_str(&format!("    {}[label=\"{}\"]\n", node_id(table), table));
    }

    output.push_str("    node [shape=recorder style=filled fillcolor=lightgray]\n\n");

    for fk in selected_edges(snapshot, selected) {
        output.push_str(&format!(
            "    {} -> {}[arrowhead=normal arrowtail=tee dir=both]\n",
            node_id(&fk.table),
            node_id(&fk.pk_table)
        ));
    }

    output.push_str("}\n");
    output
}

/// Snapshot table order restricted to the selected set.
fn selected_in_order<'a>(
    snapshot: &'a SchemaSnapshot,
    selected: &'a AHashSet<String>,
) -> impl Iterator<Item = &'a String> {
    snapshot
        .tables
        .iter()
        .filter(|table| selected.contains(table.as_str()))
}

/// Foreign keys with both endpoints selected, in source order.
fn selected_edges<'a>(
    snapshot: &'a SchemaSnapshot,
    selected: &'a AHashSet<String>,
) -> impl Iterator<Item = &'a ForeignKey> {
    snapshot
        .foreign_keys
        .iter()
        .filter(|fk| selected.contains(&fk.table) && selected.contains(&fk.pk_table))
}

/// Graph identifier for a table: dots are not valid in a node id.
///
/// Not collision-free (`a.b_c` and `a_b.c` map to the same id); acceptable as
/// long as schema names avoid underscores.
fn node_id(table: &str) -> String {
    table.replace('.', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Column;
    use ahash::AHashMap;

    fn create_test_snapshot() -> SchemaSnapshot {
        let mut columns = AHashMap::new();
        columns.insert(
            "orders".to_string(),
            vec![
                Column::new(
                    "id".to_string(),
                    "integer".to_string(),
                    false,
                    None,
                    Some(32),
                    Some(0),
                ),
                Column::new(
                    "customer_id".to_string(),
                    "integer".to_string(),
                    false,
                    None,
                    Some(32),
                    Some(0),
                ),
            ],
        );
        columns.insert(
            "customers".to_string(),
            vec![
                Column::new(
                    "id".to_string(),
                    "integer".to_string(),
                    false,
                    None,
                    Some(32),
                    Some(0),
                ),
                Column::new(
                    "name".to_string(),
                    "character varying".to_string(),
                    true,
                    Some(100),
                    None,
                    None,
                ),
            ],
        );

        let mut primary_keys = AHashMap::new();
        primary_keys.insert(
            "orders".to_string(),
            ["id".to_string()].into_iter().collect(),
        );
        primary_keys.insert(
            "customers".to_string(),
            ["id".to_string()].into_iter().collect(),
        );

        SchemaSnapshot {
            tables: vec!["customers".to_string(), "orders".to_string()],
            columns,
            primary_keys,
            foreign_keys: vec![ForeignKey {
                table: "orders".to_string(),
                column: "customer_id".to_string(),
                pk_table: "customers".to_string(),
                pk_column: "id".to_string(),
            }],
        }
    }

    fn full_selection(snapshot: &SchemaSnapshot) -> AHashSet<String> {
        snapshot.tables.iter().cloned().collect()
    }

    #[test]
    fn test_columns_mode_structure() {
        let snapshot = create_test_snapshot();
        let output = to_dot(&snapshot, &full_selection(&snapshot), RenderMode::Columns);

        assert!(output.starts_with("digraph database_schema {\n"));
        assert!(output.contains("rankdir=RL;"));
        assert!(output.contains("node [shape=plaintext]"));
        assert!(output.contains("<td colspan='2' bgcolor='lightgray'>orders</td>"));
        assert!(output.contains("<font color='blue'>id</font>"));
        assert!(output.ends_with("}\n"));
    }

    #[test]
    fn test_columns_mode_ports_and_edges() {
        let snapshot = create_test_snapshot();
        let output = to_dot(&snapshot, &full_selection(&snapshot), RenderMode::Columns);

        assert!(output.contains("<td port='customer_id' align='left'>"));
        assert!(output.contains("<td port='customer_id_to' align='left'>"));
        assert!(output
            .contains("orders:customer_id -> customers:id_TO[arrowhead=normal arrowtail=tee dir=both]"));
    }

    #[test]
    fn test_names_only_mode() {
        let snapshot = create_test_snapshot();
        let output = to_dot(&snapshot, &full_selection(&snapshot), RenderMode::NamesOnly);

        assert!(output.contains("node [shape=block]"));
        assert!(output.contains("    orders[label=\"orders\"]\n"));
        assert!(output.contains("    customers[label=\"customers\"]\n"));
        assert!(output.contains("orders -> customers[arrowhead=normal arrowtail=tee dir=both]"));
        assert!(!output.contains("customer_id"));
    }

    #[test]
    fn test_edges_filtered_by_selection() {
        let snapshot = create_test_snapshot();
        let selected: AHashSet<String> = ["orders".to_string()].into_iter().collect();
        let output = to_dot(&snapshot, &selected, RenderMode::NamesOnly);

        assert!(output.contains("orders[label="));
        assert!(!output.contains("customers[label="));
        assert!(!output.contains("->"));
    }

    #[test]
    fn test_empty_selection_is_valid_graph() {
        let snapshot = create_test_snapshot();
        let output = to_dot(&snapshot, &AHashSet::new(), RenderMode::Columns);

        assert!(output.starts_with("digraph database_schema {\n"));
        assert!(output.ends_with("}\n"));
        assert!(!output.contains("label"));
    }

    #[test]
    fn test_qualified_name_becomes_identifier() {
        let mut snapshot = create_test_snapshot();
        snapshot.tables.push("sales.invoices".to_string());

        let output = to_dot(&snapshot, &full_selection(&snapshot), RenderMode::NamesOnly);
        assert!(output.contains("    sales_invoices[label=\"sales.invoices\"]\n"));
    }
}

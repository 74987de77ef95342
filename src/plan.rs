//! Turning sheet rows into per-table clustering requests.

use std::collections::BTreeMap;

use log::warn;
use serde_json::Value;

use crate::sheet::ValueGrid;

const TABLE_NAME_COLUMN: usize = 0;
const FIRST_CLUSTER_COLUMN: usize = 1;
const MAX_CLUSTER_COLUMNS: usize = 4;
const CLUSTERED_FLAG_COLUMN: usize = 6;

/// A table named on a sheet row. `row_index` is zero-based within the range.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TableIdentifier {
    pub row_index: usize,
    pub table_name: String,
}

/// Clustering columns in precedence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSpec(Vec<String>);

impl ClusterSpec {
    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<&str>> for ClusterSpec {
    fn from(columns: Vec<&str>) -> Self {
        ClusterSpec(columns.into_iter().map(String::from).collect())
    }
}

#[derive(Debug, Default)]
pub struct ClusterPlan {
    entries: BTreeMap<TableIdentifier, ClusterSpec>,
    pub already_clustered: usize,
    pub blank: usize,
}

impl ClusterPlan {
    pub fn from_grid(grid: &ValueGrid, none_marker: &str) -> Self {
        let mut plan = ClusterPlan::default();
        for (row_index, row) in grid.iter().enumerate() {
            if parse_bool(&cell_text(row, CLUSTERED_FLAG_COLUMN)) {
                plan.already_clustered += 1;
                continue;
            }
            let table_name = cell_text(row, TABLE_NAME_COLUMN);
            if table_name.is_empty() {
                if row.iter().any(|cell| !cell_as_string(cell).trim().is_empty()) {
                    warn!("row {row_index} has no table name, skipping");
                }
                plan.blank += 1;
                continue;
            }

            let mut spec = ClusterSpec::default();
            for col in FIRST_CLUSTER_COLUMN..FIRST_CLUSTER_COLUMN + MAX_CLUSTER_COLUMNS {
                let column = cell_text(row, col);
                if column.is_empty() || column == none_marker {
                    continue;
                }
                spec.0.push(column);
            }
            plan.entries.insert(
                TableIdentifier {
                    row_index,
                    table_name,
                },
                spec,
            );
        }
        plan
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sheet order.
    pub fn iter(&self) -> impl Iterator<Item = (&TableIdentifier, &ClusterSpec)> {
        self.entries.iter()
    }
}

fn cell_as_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        other => other.to_string(),
    }
}

fn cell_text(row: &[Value], col: usize) -> String {
    row.get(col)
        .map(|cell| cell_as_string(cell).trim().to_string())
        .unwrap_or_default()
}

/// Accepts `1 t T TRUE true True`; everything else is false.
fn parse_bool(s: &str) -> bool {
    matches!(s, "1" | "t" | "T" | "TRUE" | "true" | "True")
}

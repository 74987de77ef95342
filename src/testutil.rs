//! In-memory fakes of the sheet and table services.
//!
//! This module is only available when the `testutil` feature is enabled.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::bigquery::{TableClientFactory, TableService, TableUpdateError};
use crate::core::ClusterError;
use crate::sheet::{RowStatus, SheetService, ValueGrid};

/// Build a seven-cell row: table, four cluster columns, an unused cell and
/// the "already clustered" flag.
pub fn sheet_row(table: &str, columns: [&str; 4], clustered: bool) -> Vec<Value> {
    let mut row = vec![Value::String(table.to_string())];
    row.extend(columns.iter().map(|c| Value::String(c.to_string())));
    row.push(Value::String(String::new()));
    let flag = if clustered { "TRUE" } else { "FALSE" };
    row.push(Value::String(flag.to_string()));
    row
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCall {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
    pub columns: Vec<String>,
}

#[derive(Default)]
struct FactoryState {
    connects: Vec<String>,
    closes: HashMap<String, usize>,
    updates: Vec<UpdateCall>,
    failing_projects: HashSet<String>,
    failing_tables: HashMap<String, TableUpdateError>,
}

/// Records every connect, update and close. Clones share state.
#[derive(Clone, Default)]
pub struct FakeTableFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl FakeTableFactory {
    /// Make `connect` fail for `project_id`.
    pub fn failing_project(self, project_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_projects
            .insert(project_id.to_string());
        self
    }

    /// Make updates of `project.dataset.table` fail with `err`.
    pub fn failing_table(self, table: &str, err: TableUpdateError) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_tables
            .insert(table.to_string(), err);
        self
    }

    pub fn connects(&self) -> Vec<String> {
        self.state.lock().unwrap().connects.clone()
    }

    pub fn close_count(&self, project_id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .closes
            .get(project_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn updates(&self) -> Vec<UpdateCall> {
        self.state.lock().unwrap().updates.clone()
    }
}

#[async_trait]
impl TableClientFactory for FakeTableFactory {
    async fn connect(&self, project_id: &str) -> Result<Arc<dyn TableService>, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.connects.push(project_id.to_string());
        if state.failing_projects.contains(project_id) {
            return Err(ClusterError::ClientInit {
                project: project_id.to_string(),
                reason: "credentials rejected".to_string(),
            });
        }
        Ok(Arc::new(FakeTableClient {
            project_id: project_id.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeTableClient {
    project_id: String,
    state: Arc<Mutex<FactoryState>>,
}

#[async_trait]
impl TableService for FakeTableClient {
    async fn set_clustering(
        &self,
        dataset_id: &str,
        table_id: &str,
        columns: &[String],
    ) -> Result<(), TableUpdateError> {
        let mut state = self.state.lock().unwrap();
        state.updates.push(UpdateCall {
            project_id: self.project_id.clone(),
            dataset_id: dataset_id.to_string(),
            table_id: table_id.to_string(),
            columns: columns.to_vec(),
        });
        let name = format!("{}.{dataset_id}.{table_id}", self.project_id);
        match state.failing_tables.get(&name) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn close(&self) {
        *self
            .state
            .lock()
            .unwrap()
            .closes
            .entry(self.project_id.clone())
            .or_default() += 1;
    }
}

#[derive(Default)]
struct SheetState {
    grid: ValueGrid,
    read_error: Option<String>,
    reads: Vec<(String, String)>,
    writes: Vec<(u32, RowStatus)>,
    failing_rows: HashSet<u32>,
}

/// Serves a fixed grid and records status writes. Clones share state.
#[derive(Clone, Default)]
pub struct FakeSheet {
    state: Arc<Mutex<SheetState>>,
}

impl FakeSheet {
    pub fn with_rows(rows: ValueGrid) -> Self {
        let sheet = Self::default();
        sheet.state.lock().unwrap().grid = rows;
        sheet
    }

    pub fn failing_read(self, message: &str) -> Self {
        self.state.lock().unwrap().read_error = Some(message.to_string());
        self
    }

    pub fn failing_row(self, row: u32) -> Self {
        self.state.lock().unwrap().failing_rows.insert(row);
        self
    }

    /// `(spreadsheet_id, range)` of every read.
    pub fn reads(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().reads.clone()
    }

    /// Successful status writes as `(row, status)`.
    pub fn writes(&self) -> Vec<(u32, RowStatus)> {
        self.state.lock().unwrap().writes.clone()
    }
}

#[async_trait]
impl SheetService for FakeSheet {
    async fn read_range(&self, spreadsheet_id: &str, range: &str) -> Result<ValueGrid, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state
            .reads
            .push((spreadsheet_id.to_string(), range.to_string()));
        match &state.read_error {
            Some(message) => Err(ClusterError::Sheet(message.clone())),
            None => Ok(state.grid.clone()),
        }
    }

    async fn write_row_status(
        &self,
        _spreadsheet_id: &str,
        row: u32,
        status: &RowStatus,
    ) -> Result<(), ClusterError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_rows.contains(&row) {
            return Err(ClusterError::WriteStatus {
                row,
                reason: "quota exceeded".to_string(),
            });
        }
        state.writes.push((row, status.clone()));
        Ok(())
    }
}

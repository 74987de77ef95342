#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

pub const TOKEN: &str = "test-token";

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn google_error(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "error": { "code": status.as_u16(), "message": message, "status": "ERROR" }
    });
    (status, Json(body)).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchCall {
    pub table: String,
    pub if_match: Option<String>,
    pub body: Value,
}

#[derive(Default)]
pub struct BigQueryState {
    pub etag_version: u32,
    pub conflicts_remaining: u32,
    pub gets: usize,
    pub patches: Vec<PatchCall>,
    pub missing_tables: HashSet<String>,
    pub invalid_columns: HashSet<String>,
}

/// In-process stand-in for the BigQuery `tables` REST resource.
#[derive(Clone, Default)]
pub struct BigQueryMock {
    pub state: Arc<Mutex<BigQueryState>>,
}

impl BigQueryMock {
    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/bigquery/v2/projects/{project}/datasets/{dataset}/tables/{table}",
                get(get_table).patch(patch_table),
            )
            .with_state(self.clone())
    }

    pub fn patches(&self) -> Vec<PatchCall> {
        self.state.lock().unwrap().patches.clone()
    }

    pub fn gets(&self) -> usize {
        self.state.lock().unwrap().gets
    }
}

async fn get_table(
    State(mock): State<BigQueryMock>,
    Path((project, dataset, table)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Request is missing credentials");
    }
    let mut state = mock.state.lock().unwrap();
    state.gets += 1;
    if state.missing_tables.contains(&table) {
        return google_error(
            StatusCode::NOT_FOUND,
            &format!("Not found: Table {project}:{dataset}.{table}"),
        );
    }
    Json(json!({
        "kind": "bigquery#table",
        "id": format!("{project}:{dataset}.{table}"),
        "etag": format!("etag-{}", state.etag_version),
    }))
    .into_response()
}

async fn patch_table(
    State(mock): State<BigQueryMock>,
    Path((_project, _dataset, table)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = mock.state.lock().unwrap();
    let if_match = headers
        .get(header::IF_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.patches.push(PatchCall {
        table: table.clone(),
        if_match: if_match.clone(),
        body: body.clone(),
    });

    if state.conflicts_remaining > 0 {
        state.conflicts_remaining -= 1;
        state.etag_version += 1;
        return google_error(StatusCode::PRECONDITION_FAILED, "Precondition check failed.");
    }
    if if_match.as_deref() != Some(format!("etag-{}", state.etag_version).as_str()) {
        return google_error(StatusCode::PRECONDITION_FAILED, "Precondition check failed.");
    }
    let fields = body["clustering"]["fields"].as_array().cloned().unwrap_or_default();
    if let Some(bad) = fields
        .iter()
        .filter_map(Value::as_str)
        .find(|f| state.invalid_columns.contains(*f))
    {
        return google_error(
            StatusCode::BAD_REQUEST,
            &format!("The field specified for clustering cannot be found in the schema: {bad}"),
        );
    }
    state.etag_version += 1;
    Json(json!({ "clustering": body["clustering"].clone() })).into_response()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuesWrite {
    pub range: String,
    pub value_input_option: Option<String>,
    pub body: Value,
}

#[derive(Default)]
pub struct SheetsState {
    pub grids: HashMap<String, Value>,
    pub writes: Vec<ValuesWrite>,
    pub rejected_ranges: HashSet<String>,
}

/// In-process stand-in for the Sheets `spreadsheets.values` REST resource.
#[derive(Clone, Default)]
pub struct SheetsMock {
    pub state: Arc<Mutex<SheetsState>>,
}

impl SheetsMock {
    pub fn with_grid(spreadsheet_id: &str, values: Value) -> Self {
        let mock = Self::default();
        mock.state
            .lock()
            .unwrap()
            .grids
            .insert(spreadsheet_id.to_string(), values);
        mock
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/v4/spreadsheets/{id}/values/{range}",
                get(get_values).put(put_values),
            )
            .with_state(self.clone())
    }

    pub fn writes(&self) -> Vec<ValuesWrite> {
        self.state.lock().unwrap().writes.clone()
    }
}

async fn get_values(
    State(mock): State<SheetsMock>,
    Path((id, range)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Request is missing credentials");
    }
    let state = mock.state.lock().unwrap();
    match state.grids.get(&id) {
        Some(values) => Json(json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        }))
        .into_response(),
        None if id == "empty" => {
            Json(json!({ "range": range, "majorDimension": "ROWS" })).into_response()
        }
        None => google_error(StatusCode::NOT_FOUND, "Requested entity was not found."),
    }
}

async fn put_values(
    State(mock): State<SheetsMock>,
    Path((_id, range)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = mock.state.lock().unwrap();
    if state.rejected_ranges.contains(&range) {
        return google_error(StatusCode::FORBIDDEN, "The caller does not have permission");
    }
    state.writes.push(ValuesWrite {
        range: range.clone(),
        value_input_option: params.get("valueInputOption").cloned(),
        body,
    });
    Json(json!({ "updatedRange": range, "updatedCells": 3 })).into_response()
}

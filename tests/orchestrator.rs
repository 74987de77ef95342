mod common;

use std::sync::Arc;
use std::time::Duration;

use bqcluster::auth::StaticToken;
use bqcluster::bigquery::{BigQueryClientFactory, TableUpdateError};
use bqcluster::conf::{BigQueryConfig, SheetConfig};
use bqcluster::core::ClusterError;
use bqcluster::orchestrator::{Orchestrator, RunSettings, RunSummary};
use bqcluster::sheet::SheetsClient;
use bqcluster::testutil::{FakeSheet, FakeTableFactory, UpdateCall, sheet_row};
use serde_json::json;

use common::{BigQueryMock, SheetsMock, TOKEN, serve};

fn settings(range: &str) -> RunSettings {
    let config = SheetConfig {
        spreadsheet_id: "sheet-1".to_string(),
        range: range.to_string(),
        ..SheetConfig::default()
    };
    RunSettings::from_config(&config).unwrap()
}

/// One pending and one already clustered row: only the pending one is touched.
#[tokio::test]
async fn test_end_to_end_skips_clustered_rows() {
    let sheet = FakeSheet::with_rows(vec![
        sheet_row("p.d.t1", ["a", "b", "NONE", "NONE"], false),
        sheet_row("p.d.t2", ["c", "d", "e", "f"], true),
    ]);
    let factory = FakeTableFactory::default();
    let mut orchestrator =
        Orchestrator::new(settings("B29:H30"), sheet.clone(), factory.clone(), 5);

    let summary = orchestrator.run().await.unwrap();

    assert_eq!(
        factory.updates(),
        vec![UpdateCall {
            project_id: "p".to_string(),
            dataset_id: "d".to_string(),
            table_id: "t1".to_string(),
            columns: vec!["a".to_string(), "b".to_string()],
        }]
    );
    let writes = sheet.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, 29);
    assert!(writes[0].1.success);
    assert_eq!(writes[0].1.message, "");
    assert_eq!(
        summary,
        RunSummary {
            updated: 1,
            already_clustered: 1,
            ..RunSummary::default()
        }
    );
    assert_eq!(sheet.reads(), vec![("sheet-1".to_string(), "Sheet1!B29:H30".to_string())]);
}

/// Status rows are the range start row plus the row index.
#[tokio::test]
async fn test_status_row_mapping() {
    let sheet = FakeSheet::with_rows(vec![
        sheet_row("p.d.t0", ["a", "NONE", "NONE", "NONE"], true),
        sheet_row("p.d.t1", ["a", "NONE", "NONE", "NONE"], false),
        sheet_row("p.d.t2", ["a", "NONE", "NONE", "NONE"], true),
        sheet_row("p.d.t3", ["a", "NONE", "NONE", "NONE"], false),
    ]);
    let mut orchestrator = Orchestrator::new(
        settings("B12:H28"),
        sheet.clone(),
        FakeTableFactory::default(),
        5,
    );

    orchestrator.run().await.unwrap();

    let rows: Vec<u32> = sheet.writes().iter().map(|(row, _)| *row).collect();
    assert_eq!(rows, vec![13, 15]);
}

/// A failed update is reported on its row and does not stop the batch.
#[tokio::test]
async fn test_failures_are_written_back() {
    let sheet = FakeSheet::with_rows(vec![
        sheet_row("p.d.missing", ["a", "NONE", "NONE", "NONE"], false),
        sheet_row("not-a-table", ["a", "NONE", "NONE", "NONE"], false),
        sheet_row("p.d.empty", ["NONE", "NONE", "NONE", "NONE"], false),
        sheet_row("p.d.ok", ["a", "NONE", "NONE", "NONE"], false),
    ]);
    let factory = FakeTableFactory::default().failing_table(
        "p.d.missing",
        TableUpdateError::NotFound("Not found: Table p:d.missing".to_string()),
    );
    let mut orchestrator = Orchestrator::new(settings("B2:H5"), sheet.clone(), factory.clone(), 5);

    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.failed, 3);
    let writes = sheet.writes();
    assert_eq!(writes.len(), 4);
    assert_eq!(writes[0].0, 2);
    assert!(!writes[0].1.success);
    assert_eq!(writes[0].1.message, "Not found: Table p:d.missing");
    assert!(!writes[1].1.success);
    assert!(writes[1].1.message.contains("project.dataset.table"));
    assert!(!writes[2].1.success);
    assert!(writes[2].1.message.contains("no clustering columns"));
    assert!(writes[3].1.success);
    // Only well-formed rows with columns reach BigQuery.
    assert_eq!(factory.updates().len(), 2);
}

/// A project whose client cannot be created fails its rows only.
#[tokio::test]
async fn test_client_init_failure_skips_table() {
    let sheet = FakeSheet::with_rows(vec![
        sheet_row("locked.d.t", ["a", "NONE", "NONE", "NONE"], false),
        sheet_row("open.d.t", ["a", "NONE", "NONE", "NONE"], false),
    ]);
    let factory = FakeTableFactory::default().failing_project("locked");
    let mut orchestrator = Orchestrator::new(settings("B2:H3"), sheet.clone(), factory.clone(), 5);

    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.updated, 1);
    let writes = sheet.writes();
    assert!(writes[0].1.message.contains("locked"));
    assert!(writes[1].1.success);
}

/// Status write failures are counted and the run carries on.
#[tokio::test]
async fn test_write_failure_does_not_abort() {
    let sheet = FakeSheet::with_rows(vec![
        sheet_row("p.d.t1", ["a", "NONE", "NONE", "NONE"], false),
        sheet_row("p.d.t2", ["a", "NONE", "NONE", "NONE"], false),
    ])
    .failing_row(2);
    let factory = FakeTableFactory::default();
    let mut orchestrator = Orchestrator::new(settings("B2:H3"), sheet.clone(), factory.clone(), 5);

    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.status_write_failures, 1);
    assert_eq!(summary.updated, 2);
    assert_eq!(sheet.writes().len(), 1);
    assert_eq!(sheet.writes()[0].0, 3);
}

/// A row past the last addressable sheet row fails without touching BigQuery.
#[tokio::test]
async fn test_row_past_sheet_end_is_skipped() {
    let sheet = FakeSheet::with_rows(vec![
        sheet_row("p.d.t1", ["a", "NONE", "NONE", "NONE"], false),
        sheet_row("p.d.t2", ["a", "NONE", "NONE", "NONE"], false),
    ]);
    let factory = FakeTableFactory::default();
    let mut orchestrator = Orchestrator::new(
        settings("B4294967295:H"),
        sheet.clone(),
        factory.clone(),
        5,
    );

    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(factory.updates().len(), 1);
    assert_eq!(factory.updates()[0].table_id, "t1");
    let writes = sheet.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, u32::MAX);
}

#[tokio::test]
async fn test_read_failure_aborts_run() {
    let sheet = FakeSheet::default().failing_read("quota exceeded");
    let factory = FakeTableFactory::default();
    let mut orchestrator = Orchestrator::new(settings("B2:H3"), sheet, factory.clone(), 5);

    let err = orchestrator.run().await.unwrap_err();

    assert_eq!(err, ClusterError::Sheet("quota exceeded".to_string()));
    assert!(factory.connects().is_empty());
}

/// More projects than cache slots: clients are reused, evicted and closed.
#[tokio::test]
async fn test_clients_are_cached_per_project() {
    let sheet = FakeSheet::with_rows(vec![
        sheet_row("p1.d.a", ["x", "NONE", "NONE", "NONE"], false),
        sheet_row("p1.d.b", ["x", "NONE", "NONE", "NONE"], false),
        sheet_row("p2.d.a", ["x", "NONE", "NONE", "NONE"], false),
        sheet_row("p3.d.a", ["x", "NONE", "NONE", "NONE"], false),
        sheet_row("p2.d.b", ["x", "NONE", "NONE", "NONE"], false),
    ]);
    let factory = FakeTableFactory::default();
    let mut orchestrator = Orchestrator::new(settings("B2:H6"), sheet, factory.clone(), 2);

    orchestrator.run().await.unwrap();

    assert_eq!(factory.connects(), vec!["p1", "p2", "p3"]);
    for project in ["p1", "p2", "p3"] {
        assert_eq!(factory.close_count(project), 1);
    }
    assert!(orchestrator.cache().is_empty());
}

/// The real REST clients wired together against mock Google endpoints.
#[tokio::test]
async fn test_run_against_mock_services() {
    let sheets = SheetsMock::with_grid(
        "sheet-1",
        json!([
            ["data-platform.sales.orders", "country", "order_date", "NONE", "NONE", "", "FALSE"],
            ["data-platform.sales.refunds", "country", "NONE", "NONE", "NONE", "", "TRUE"],
            ["data-platform.sales.ghost", "country"]
        ]),
    );
    let bigquery = BigQueryMock::default();
    bigquery
        .state
        .lock()
        .unwrap()
        .missing_tables
        .insert("ghost".to_string());

    let tokens = Arc::new(StaticToken(TOKEN.to_string()));
    let sheet_config = SheetConfig {
        spreadsheet_id: "sheet-1".to_string(),
        base_url: serve(sheets.router()).await,
        ..SheetConfig::default()
    };
    let bigquery_config = BigQueryConfig {
        base_url: serve(bigquery.router()).await,
        retry_backoff: Duration::from_millis(5),
        ..BigQueryConfig::default()
    };
    let sheet = SheetsClient::new(&sheet_config, tokens.clone()).unwrap();
    let factory = BigQueryClientFactory::new(&bigquery_config, tokens).unwrap();
    let mut orchestrator = Orchestrator::new(
        RunSettings::from_config(&sheet_config).unwrap(),
        sheet,
        factory,
        bigquery_config.max_clients,
    );

    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.already_clustered, 1);

    let patches = bigquery.patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].table, "orders");

    let writes = sheets.writes();
    let ranges: Vec<&str> = writes.iter().map(|w| w.range.as_str()).collect();
    assert_eq!(ranges, vec!["Sheet1!H29", "Sheet1!H31"]);
    assert_eq!(writes[0].body["values"][0][0], json!(true));
    assert_eq!(writes[1].body["values"][0][0], json!(false));
    assert_eq!(
        writes[1].body["values"][0][2],
        json!("Not found: Table data-platform:sales.ghost")
    );
}

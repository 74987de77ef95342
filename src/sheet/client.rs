use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{RowStatus, SheetService, ValueGrid, cell_address};
use crate::auth::{SHEETS_SCOPE, TokenProvider};
use crate::bigquery::google_error_message;
use crate::conf::SheetConfig;
use crate::core::ClusterError;

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: ValueGrid,
}

#[derive(Serialize)]
struct ValueRangeUpdate<'a> {
    range: &'a str,
    #[serde(rename = "majorDimension")]
    major_dimension: &'static str,
    values: Vec<Vec<Value>>,
}

/// Google Sheets `spreadsheets.values` REST client.
pub struct SheetsClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: Url,
    worksheet: String,
    status_column: String,
}

impl SheetsClient {
    pub fn new(config: &SheetConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, ClusterError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClusterError::ConfigParsingError(format!("sheet.base_url '{}': {e}", config.base_url))
        })?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("bqcluster/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClusterError::Sheet(format!("building HTTP client: {e}")))?;
        Ok(Self {
            http,
            tokens,
            base_url,
            worksheet: config.worksheet.clone(),
            status_column: config.status_column.clone(),
        })
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, ClusterError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClusterError::Sheet(format!("invalid base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
        Ok(url)
    }

    async fn bearer(&self) -> Result<String, ClusterError> {
        self.tokens.token(&[SHEETS_SCOPE]).await
    }
}

async fn check(response: Response, err: impl Fn(String) -> ClusterError) -> Result<Response, ClusterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(err(format!("{status}: {}", google_error_message(&body))))
}

#[async_trait]
impl SheetService for SheetsClient {
    async fn read_range(&self, spreadsheet_id: &str, range: &str) -> Result<ValueGrid, ClusterError> {
        let url = self.values_url(spreadsheet_id, range)?;
        let token = self.bearer().await?;
        let sheet_err = |reason: String| ClusterError::Sheet(format!("reading {range}: {reason}"));

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| sheet_err(e.to_string()))?;
        let values: ValueRange = check(response, &sheet_err)
            .await?
            .json()
            .await
            .map_err(|e| sheet_err(e.to_string()))?;

        if values.values.is_empty() {
            info!("No data found in {range}.");
        } else {
            debug!("read {} rows from {range}", values.values.len());
        }
        Ok(values.values)
    }

    async fn write_row_status(
        &self,
        spreadsheet_id: &str,
        row: u32,
        status: &RowStatus,
    ) -> Result<(), ClusterError> {
        let cell = cell_address(&self.worksheet, &self.status_column, row);
        let write_err = |reason: String| ClusterError::WriteStatus { row, reason };

        let mut url = self
            .values_url(spreadsheet_id, &cell)
            .map_err(|e| write_err(e.to_string()))?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let token = self.bearer().await.map_err(|e| write_err(e.to_string()))?;
        let body = ValueRangeUpdate {
            range: &cell,
            major_dimension: "ROWS",
            values: vec![status.to_cells()],
        };

        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| write_err(e.to_string()))?;
        check(response, &write_err).await?;
        Ok(())
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::IF_MATCH;
use reqwest::{Response, Url};
use serde::Deserialize;
use serde_json::json;

use super::{TableClientFactory, TableService, TableUpdateError};
use crate::auth::{BIGQUERY_SCOPE, TokenProvider};
use crate::conf::BigQueryConfig;
use crate::core::ClusterError;

#[derive(Deserialize)]
struct TableMetadata {
    etag: Option<String>,
}

/// BigQuery REST client bound to one project.
pub struct BigQueryTableClient {
    project_id: String,
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: Url,
    max_attempts: u32,
    retry_backoff: Duration,
    closed: AtomicBool,
}

impl BigQueryTableClient {
    fn table_url(&self, dataset_id: &str, table_id: &str) -> Result<Url, TableUpdateError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TableUpdateError::Transport(format!("invalid base url {}", self.base_url)))?
            .pop_if_empty()
            .extend([
                "bigquery",
                "v2",
                "projects",
                self.project_id.as_str(),
                "datasets",
                dataset_id,
                "tables",
                table_id,
            ]);
        Ok(url)
    }

    async fn bearer(&self) -> Result<String, TableUpdateError> {
        self.tokens
            .token(&[BIGQUERY_SCOPE])
            .await
            .map_err(|e| TableUpdateError::Unauthenticated(e.to_string()))
    }

    async fn fetch_etag(&self, url: &Url, token: &str) -> Result<Option<String>, TableUpdateError> {
        let response = self.http.get(url.clone()).bearer_auth(token).send().await?;
        let metadata: TableMetadata = check(response).await?.json().await?;
        Ok(metadata.etag)
    }

    async fn patch_clustering(
        &self,
        url: &Url,
        token: &str,
        etag: Option<&str>,
        columns: &[String],
    ) -> Result<(), TableUpdateError> {
        let mut request = self
            .http
            .patch(url.clone())
            .bearer_auth(token)
            .json(&json!({ "clustering": { "fields": columns } }));
        if let Some(etag) = etag {
            request = request.header(IF_MATCH, etag);
        }
        check(request.send().await?).await?;
        Ok(())
    }

    async fn try_set_clustering(&self, url: &Url, columns: &[String]) -> Result<(), TableUpdateError> {
        let token = self.bearer().await?;
        let etag = self.fetch_etag(url, &token).await?;
        self.patch_clustering(url, &token, etag.as_deref(), columns)
            .await
    }
}

async fn check(response: Response) -> Result<Response, TableUpdateError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TableUpdateError::from_response(status, &body))
}

#[async_trait]
impl TableService for BigQueryTableClient {
    async fn set_clustering(
        &self,
        dataset_id: &str,
        table_id: &str,
        columns: &[String],
    ) -> Result<(), TableUpdateError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TableUpdateError::Transport(format!(
                "client for project {} is closed",
                self.project_id
            )));
        }
        let url = self.table_url(dataset_id, table_id)?;

        let mut attempt = 1;
        loop {
            match self.try_set_clustering(&url, columns).await {
                Err(err) if err.is_conflict() && attempt < self.max_attempts => {
                    warn!(
                        "etag conflict on {}.{}.{} (attempt {}/{}), refetching",
                        self.project_id, dataset_id, table_id, attempt, self.max_attempts
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("closed BigQuery client for project {}", self.project_id);
        }
    }
}

/// Opens one [`BigQueryTableClient`] per project, sharing a token source.
pub struct BigQueryClientFactory {
    tokens: Arc<dyn TokenProvider>,
    base_url: Url,
    config: BigQueryConfig,
}

impl BigQueryClientFactory {
    pub fn new(config: &BigQueryConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, ClusterError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClusterError::ConfigParsingError(format!("bigquery.base_url '{}': {e}", config.base_url))
        })?;
        Ok(Self {
            tokens,
            base_url,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl TableClientFactory for BigQueryClientFactory {
    async fn connect(&self, project_id: &str) -> Result<Arc<dyn TableService>, ClusterError> {
        let init_err = |reason: String| ClusterError::ClientInit {
            project: project_id.to_string(),
            reason,
        };
        if project_id.is_empty() {
            return Err(init_err("empty project id".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .user_agent(concat!("bqcluster/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| init_err(e.to_string()))?;
        // Credentials that cannot mint a token are a client setup failure.
        self.tokens
            .token(&[BIGQUERY_SCOPE])
            .await
            .map_err(|e| init_err(e.to_string()))?;

        debug!("opened BigQuery client for project {project_id}");
        Ok(Arc::new(BigQueryTableClient {
            project_id: project_id.to_string(),
            http,
            tokens: Arc::clone(&self.tokens),
            base_url: self.base_url.clone(),
            max_attempts: self.config.max_update_attempts.max(1),
            retry_backoff: self.config.retry_backoff,
            closed: AtomicBool::new(false),
        }))
    }
}

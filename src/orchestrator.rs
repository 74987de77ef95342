use std::time::Instant;

use chrono::Utc;
use log::{error, info};

use crate::bigquery::{ClientCache, TableClientFactory, TableRef};
use crate::conf::SheetConfig;
use crate::core::ClusterError;
use crate::plan::{ClusterPlan, ClusterSpec, TableIdentifier};
use crate::sheet::{A1Range, RowStatus, SheetService};

/// Which spreadsheet rows a run reads and how they are interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub range: A1Range,
    pub none_marker: String,
}

impl RunSettings {
    pub fn from_config(config: &SheetConfig) -> Result<Self, ClusterError> {
        let range = config
            .range
            .parse::<A1Range>()
            .map_err(|e| ClusterError::ConfigParsingError(format!("sheet.range: {e}")))?;
        Ok(Self {
            spreadsheet_id: config.spreadsheet_id.clone(),
            worksheet: config.worksheet.clone(),
            range,
            none_marker: config.none_marker.clone(),
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub updated: usize,
    pub failed: usize,
    pub status_write_failures: usize,
    pub already_clustered: usize,
    pub blank: usize,
}

/// One batch: read the sheet, cluster every pending table, report back.
pub struct Orchestrator<S, F> {
    settings: RunSettings,
    sheet: S,
    cache: ClientCache<F>,
}

impl<S: SheetService, F: TableClientFactory> Orchestrator<S, F> {
    pub fn new(settings: RunSettings, sheet: S, factory: F, max_clients: usize) -> Self {
        Self {
            settings,
            sheet,
            cache: ClientCache::new(factory, max_clients),
        }
    }

    pub fn cache(&self) -> &ClientCache<F> {
        &self.cache
    }

    pub async fn run(&mut self) -> Result<RunSummary, ClusterError> {
        let range = self.settings.range.qualified(&self.settings.worksheet);
        let grid = self
            .sheet
            .read_range(&self.settings.spreadsheet_id, &range)
            .await?;

        let plan = ClusterPlan::from_grid(&grid, &self.settings.none_marker);
        info!(
            "{} of {} rows in {range} need clustering ({} already clustered)",
            plan.len(),
            grid.len(),
            plan.already_clustered
        );

        let mut summary = RunSummary {
            already_clustered: plan.already_clustered,
            blank: plan.blank,
            ..RunSummary::default()
        };

        for (ident, spec) in plan.iter() {
            let Some(row) = self.settings.range.row_number(ident.row_index) else {
                summary.failed += 1;
                error!(
                    "{} at index {} of {range} has no sheet row, skipping",
                    ident.table_name, ident.row_index
                );
                continue;
            };
            let started = Instant::now();
            let status = match self.cluster_table(ident, spec).await {
                Ok(table) => {
                    summary.updated += 1;
                    info!(
                        "{table} column {} has been clustered. Clustering took {}ms",
                        spec.columns().join(", "),
                        started.elapsed().as_millis()
                    );
                    RowStatus::succeeded(Utc::now())
                }
                Err(err) => {
                    summary.failed += 1;
                    error!("Clustering {} failed: {err}", ident.table_name);
                    RowStatus::failed(err.to_string(), Utc::now())
                }
            };

            if let Err(err) = self
                .sheet
                .write_row_status(&self.settings.spreadsheet_id, row, &status)
                .await
            {
                summary.status_write_failures += 1;
                error!("Error updating status on row {row}: {err}");
            }
        }

        self.cache.close_all();
        Ok(summary)
    }

    async fn cluster_table(
        &mut self,
        ident: &TableIdentifier,
        spec: &ClusterSpec,
    ) -> Result<TableRef, ClusterError> {
        let table: TableRef = ident.table_name.parse()?;
        if spec.is_empty() {
            return Err(ClusterError::InvalidRow(format!(
                "no clustering columns given for {table}"
            )));
        }
        let client = self.cache.get_or_create(&table.project_id).await?;
        client
            .set_clustering(&table.dataset_id, &table.table_id, spec.columns())
            .await?;
        Ok(table)
    }
}

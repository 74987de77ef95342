mod cache;
mod client;
mod error;
mod table_ref;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::ClusterError;

pub use cache::ClientCache;
pub use client::{BigQueryClientFactory, BigQueryTableClient};
pub use error::TableUpdateError;
pub(crate) use error::google_error_message;
pub use table_ref::TableRef;

/// Clustering updates against the tables of one project.
#[async_trait]
pub trait TableService: Send + Sync {
    /// Replace the clustering columns of `dataset_id.table_id`, in order.
    async fn set_clustering(
        &self,
        dataset_id: &str,
        table_id: &str,
        columns: &[String],
    ) -> Result<(), TableUpdateError>;

    /// Release the client. Called once, when it leaves the cache.
    fn close(&self);
}

#[async_trait]
pub trait TableClientFactory: Send + Sync {
    async fn connect(&self, project_id: &str) -> Result<Arc<dyn TableService>, ClusterError>;
}

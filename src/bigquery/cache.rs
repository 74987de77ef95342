use std::num::NonZeroUsize;
use std::sync::Arc;

use log::{debug, info};
use lru::LruCache;

use super::{TableClientFactory, TableService};
use crate::core::ClusterError;

/// Open table clients keyed by project, bounded to `capacity` entries with
/// least-recently-used eviction.
pub struct ClientCache<F> {
    factory: F,
    clients: LruCache<String, Arc<dyn TableService>>,
}

impl<F: TableClientFactory> ClientCache<F> {
    pub fn new(factory: F, capacity: usize) -> Self {
        Self {
            factory,
            clients: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Membership check that does not promote the entry.
    pub fn contains(&self, project_id: &str) -> bool {
        self.clients.contains(project_id)
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub async fn get_or_create(
        &mut self,
        project_id: &str,
    ) -> Result<Arc<dyn TableService>, ClusterError> {
        if let Some(client) = self.clients.get(project_id) {
            return Ok(Arc::clone(client));
        }

        let client = self.factory.connect(project_id).await?;
        if let Some((evicted, old)) = self
            .clients
            .push(project_id.to_string(), Arc::clone(&client))
        {
            info!("evicting BigQuery client for project {evicted}");
            old.close();
        }
        debug!(
            "cached client for project {project_id} ({}/{})",
            self.clients.len(),
            self.clients.cap()
        );
        Ok(client)
    }

    /// Close and drop every cached client.
    pub fn close_all(&mut self) {
        while let Some((_, client)) = self.clients.pop_lru() {
            client.close();
        }
    }
}

impl<F> Drop for ClientCache<F> {
    fn drop(&mut self) {
        while let Some((_, client)) = self.clients.pop_lru() {
            client.close();
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use compute::{AggregateCache, BillError, CacheNamespace};
use moka::future::Cache;
use tracing::debug;

/// In-process aggregate cache keyed `tenant:{id}:{namespace}:{rest}`.
/// Values are the JSON the read side renders.
#[derive(Clone)]
pub struct MokaAggregateCache {
    inner: Cache<String, Arc<serde_json::Value>>,
}

impl MokaAggregateCache {
    pub fn new(max_capacity: u64, time_to_live: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(time_to_live)
            .support_invalidation_closures()
            .build();
        Self { inner }
    }
}

#[async_trait]
impl AggregateCache for MokaAggregateCache {
    async fn invalidate(&self, tenant_id: i32, namespaces: &[CacheNamespace]) -> compute::Result<()> {
        let prefixes: Vec<String> = namespaces.iter().map(|ns| ns.key_prefix(tenant_id)).collect();
        debug!(tenant_id, ?prefixes, "Invalidating cached aggregates");

        self.inner
            .invalidate_entries_if(move |key, _| prefixes.iter().any(|prefix| key.starts_with(prefix)))
            .map_err(|e| BillError::Cache(e.to_string()))?;
        Ok(())
    }
}

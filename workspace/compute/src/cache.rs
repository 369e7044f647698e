use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// Groups of tenant-level aggregates that go stale when money moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Dashboard,
    Reports,
    Transactions,
    Accounts,
}

impl CacheNamespace {
    /// Namespaces busted after an occurrence is paid.
    pub const AFTER_PAYMENT: [CacheNamespace; 4] = [
        CacheNamespace::Dashboard,
        CacheNamespace::Reports,
        CacheNamespace::Transactions,
        CacheNamespace::Accounts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Dashboard => "dashboard",
            CacheNamespace::Reports => "reports",
            CacheNamespace::Transactions => "transactions",
            CacheNamespace::Accounts => "accounts",
        }
    }

    /// Key prefix shared by every entry of this namespace for a tenant.
    pub fn key_prefix(&self, tenant_id: i32) -> String {
        format!("tenant:{}:{}:", tenant_id, self.as_str())
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache of read-side aggregates (dashboards, reports) kept by the host application.
#[async_trait]
pub trait AggregateCache: Send + Sync {
    /// Drops every entry of `namespaces` belonging to `tenant_id`.
    async fn invalidate(&self, tenant_id: i32, namespaces: &[CacheNamespace]) -> Result<()>;
}

/// Cache that holds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl AggregateCache for NoopCache {
    async fn invalidate(&self, _tenant_id: i32, _namespaces: &[CacheNamespace]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix() {
        assert_eq!(CacheNamespace::Dashboard.key_prefix(3), "tenant:3:dashboard:");
        assert_eq!(CacheNamespace::Accounts.to_string(), "accounts");
    }

    #[tokio::test]
    async fn test_noop_cache() {
        NoopCache
            .invalidate(1, &CacheNamespace::AFTER_PAYMENT)
            .await
            .expect("noop never fails");
    }
}

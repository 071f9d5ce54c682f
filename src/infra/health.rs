//! Connectivity probes for the health endpoint.

use async_trait::async_trait;

use super::{Cache, Database};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn database(&self) -> AppResult<()>;

    async fn cache(&self) -> AppResult<()>;
}

/// Pings the live MongoDB and Redis connections.
pub struct Probes {
    database: Database,
    cache: Cache,
}

impl Probes {
    pub fn new(database: Database, cache: Cache) -> Self {
        Self { database, cache }
    }
}

#[async_trait]
impl HealthCheck for Probes {
    async fn database(&self) -> AppResult<()> {
        self.database.ping().await
    }

    async fn cache(&self) -> AppResult<()> {
        self.cache.ping().await
    }
}

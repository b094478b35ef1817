//! The remote service that builds query caches and reports their status.

use super::QueryCacheStatus;
use crate::errors::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a tracked query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(Uuid);

impl QueryId {
    /// Creates a random query id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for QueryId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for QueryId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Remote query cache operations.
///
/// Implementations own the transport. Calls are made once; the engine never
/// retries them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryCacheService: Send + Sync {
    /// Fetches the current cache status of a query.
    async fn fetch_status(&self, query_id: &QueryId) -> Result<QueryCacheStatus, ServiceError>;

    /// Asks the service to (re)build the cache of a query.
    async fn request_build(&self, query_id: &QueryId) -> Result<(), ServiceError>;
}

//! Service doubles for poller tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::errors::ServiceError;
use crate::query::{QueryCacheService, QueryCacheStatus, QueryId};

#[derive(Debug, Default)]
struct Script {
    statuses: VecDeque<Result<QueryCacheStatus, ServiceError>>,
    last_status: Option<Result<QueryCacheStatus, ServiceError>>,
    builds: VecDeque<Result<(), ServiceError>>,
    fetch_calls: Vec<QueryId>,
    build_calls: Vec<QueryId>,
}

/// A query cache service that replays scripted responses.
///
/// Status responses are returned in order; once the script runs out the last
/// one repeats. Build requests succeed unless a failure was scripted.
#[derive(Debug, Default)]
pub struct ScriptedQueryService {
    script: Mutex<Script>,
}

impl ScriptedQueryService {
    /// Creates a service with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service that returns the given statuses in order.
    #[must_use]
    pub fn with_statuses(statuses: impl IntoIterator<Item = QueryCacheStatus>) -> Self {
        let service = Self::new();
        for status in statuses {
            service.push_status(Ok(status));
        }
        service
    }

    /// Appends a status response.
    pub fn push_status(&self, response: Result<QueryCacheStatus, ServiceError>) {
        self.script.lock().statuses.push_back(response);
    }

    /// Appends a build response.
    pub fn push_build(&self, response: Result<(), ServiceError>) {
        self.script.lock().builds.push_back(response);
    }

    /// Returns how many times the status was fetched.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.script.lock().fetch_calls.len()
    }

    /// Returns how many builds were requested.
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.script.lock().build_calls.len()
    }

    /// Returns the queries whose status was fetched, in call order.
    #[must_use]
    pub fn fetched_queries(&self) -> Vec<QueryId> {
        self.script.lock().fetch_calls.clone()
    }
}

#[async_trait]
impl QueryCacheService for ScriptedQueryService {
    async fn fetch_status(&self, query_id: &QueryId) -> Result<QueryCacheStatus, ServiceError> {
        let mut script = self.script.lock();
        script.fetch_calls.push(*query_id);

        if let Some(next) = script.statuses.pop_front() {
            script.last_status = Some(next.clone());
            return next;
        }
        script
            .last_status
            .clone()
            .unwrap_or_else(|| Err(ServiceError::transport("no scripted status")))
    }

    async fn request_build(&self, query_id: &QueryId) -> Result<(), ServiceError> {
        let mut script = self.script.lock();
        script.build_calls.push(*query_id);
        script.builds.pop_front().unwrap_or(Ok(()))
    }
}

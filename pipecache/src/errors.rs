//! Error types for the pipecache engine.
//!
//! The pure coherence components never fail. Every error here comes from the
//! query cache poller, configuration loading or logging setup, and is
//! recoverable and displayable by the caller.

use crate::query::{QueryAction, QueryCacheState, QueryId};
use thiserror::Error;

/// The main error type for pipecache operations.
#[derive(Debug, Error)]
pub enum PipecacheError {
    /// Fetching the query cache status failed.
    #[error("Failed to fetch cache status for query {query_id}: {source}")]
    StatusFetch {
        /// The query whose status was requested.
        query_id: QueryId,
        /// The service failure.
        #[source]
        source: ServiceError,
    },

    /// Requesting a query cache build failed.
    #[error("Failed to request cache build for query {query_id}: {source}")]
    BuildRequest {
        /// The query whose build was requested.
        query_id: QueryId,
        /// The service failure.
        #[source]
        source: ServiceError,
    },

    /// The action is not enabled in the current state.
    #[error("{action} is not available while the query cache is {state}")]
    ActionUnavailable {
        /// The rejected action.
        action: QueryAction,
        /// The state the poller was in.
        state: QueryCacheState,
    },

    /// The poller was torn down.
    #[error("Query cache tracking for {query_id} has been closed")]
    Closed {
        /// The query that was being tracked.
        query_id: QueryId,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The logging subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),
}

impl PipecacheError {
    /// Creates an action unavailable error.
    #[must_use]
    pub fn action_unavailable(action: QueryAction, state: QueryCacheState) -> Self {
        Self::ActionUnavailable { action, state }
    }

    /// Returns true if the error came from the remote service.
    #[must_use]
    pub fn is_service_error(&self) -> bool {
        matches!(self, Self::StatusFetch { .. } | Self::BuildRequest { .. })
    }
}

/// Errors returned by a query cache service implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The call did not reach the service or its response was lost.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered and refused the request.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl ServiceError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

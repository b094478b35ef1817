//! Query dataset cache freshness tracking.
//!
//! This module provides:
//! - Status values reported by the remote service and the derived UI state
//! - The service trait the poller drives
//! - The polling state machine with Rebuild and Dismiss actions

mod poller;
#[cfg(test)]
mod poller_tests;
mod service;
mod status;

pub use poller::{
    DismissHandler, QueryCacheSnapshot, QueryCacheStatusPoller, QueryCacheStatusPollerBuilder,
    POLL_INTERVAL,
};
#[cfg(test)]
pub use service::MockQueryCacheService;
pub use service::{QueryCacheService, QueryId};
pub use status::{BuildStatus, QueryAction, QueryActions, QueryCacheState, QueryCacheStatus};

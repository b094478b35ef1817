//! # Pipecache
//!
//! Cache-coherence engine for machine-learning pipelines.
//!
//! Given the pipeline a user is editing and the pipeline whose intermediate
//! results are cached on the server, pipecache decides which steps can be
//! served from cache, summarizes what each cached step produced, and marks the
//! steps an AutoML search will optimize. It also tracks the freshness of a
//! query's dataset cache, polling the service while a build runs.
//!
//! - **Coherence**: pure, synchronous annotation of pipeline snapshots
//! - **Query cache**: a status poller with Rebuild and Dismiss actions
//! - **Events**: typed lifecycle events delivered to pluggable sinks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pipecache::prelude::*;
//!
//! let orchestrator = PipelineCacheOrchestrator::new();
//! let annotations = orchestrator.build(&PipelineSnapshot::new(steps)
//!     .with_cached_pipeline(cached)
//!     .with_cache_store(store));
//!
//! let poller = QueryCacheStatusPoller::new(query_id, service);
//! poller.open(false).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod coherence;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod query;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coherence::{
        AutoMLConfig, CascadeVerdict, PipelineCacheOrchestrator, PipelineSnapshot,
        StepTypeSearchLookup,
    };
    pub use crate::config::{EngineConfig, LogFormat, LoggingConfig};
    pub use crate::core::{
        AnnotationSummary, CacheEntry, CacheStore, CachedPipeline, DistributionKind,
        GroupType, StepAnnotation, StepDefinition, StepType,
    };
    pub use crate::errors::{PipecacheError, ServiceError};
    pub use crate::events::{CacheEvent, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::init_logging;
    pub use crate::query::{
        QueryCacheService, QueryCacheState, QueryCacheStatus, QueryCacheStatusPoller, QueryId,
    };
}

//! Testing utilities for pipecache consumers.
//!
//! This module provides:
//! - Step and cache page fixtures
//! - A scripted query cache service
//! - Assertions for annotations and poller state

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_cached_flags, assert_cached_prefix, assert_poller_state};
pub use fixtures::{
    cache_page, classifier_step, feature_generator_step, query_step, scenario_pipeline,
    transform_step,
};
pub use mocks::ScriptedQueryService;

//! Cache-coherence judgments over pipeline definitions.
//!
//! Everything here is a synchronous pure function over immutable snapshots:
//! - Step comparison and the invalidation cascade
//! - AutoML coverage annotation
//! - Distribution aggregation across cache pages
//! - The orchestrator that composes them

mod automl;
mod cascade;
mod comparator;
mod distribution;
mod orchestrator;

pub use automl::{coverage, AutoMLConfig, AutoMLCoverage, SearchLookupEntry, StepTypeSearchLookup};
pub use cascade::{annotate, CascadeVerdict};
pub use comparator::steps_equal;
pub use distribution::aggregate;
pub use orchestrator::{PipelineCacheOrchestrator, PipelineSnapshot};

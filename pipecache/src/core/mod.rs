//! Core data model for pipeline cache coherence.
//!
//! This module contains the snapshot types the engine consumes and the
//! annotations it produces:
//! - Step type and group enums
//! - Step definitions and the cached pipeline
//! - Cache pages and their distribution summaries
//! - Per-step annotations

mod annotation;
mod cache;
mod kind;
mod step;

pub use annotation::{AnnotationSummary, StepAnnotation};
pub use cache::{CacheEntry, CacheStore, DistributionKind, DistributionMap, LabelCounts};
pub use kind::{GroupType, StepType};
pub use step::{CachedPipeline, FunctionSpec, StepDefinition};

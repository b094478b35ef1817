//! Composes the coherence components into one annotated step list.

use super::{aggregate, annotate, coverage, AutoMLConfig, StepTypeSearchLookup};
use crate::config::EngineConfig;
use crate::core::{
    AnnotationSummary, CacheStore, CachedPipeline, DistributionMap, StepAnnotation,
    StepDefinition,
};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Everything the orchestrator reads, captured at one point in time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineSnapshot {
    /// The current, user-edited step list.
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
    /// The step list that produced the stored artifacts.
    #[serde(default)]
    pub cached_pipeline: CachedPipeline,
    /// Stored artifact pages keyed by output name.
    #[serde(default)]
    pub cache_store: CacheStore,
    /// The AutoML settings.
    #[serde(default)]
    pub automl: AutoMLConfig,
}

impl PipelineSnapshot {
    /// Creates a snapshot of the current steps with no cache and default AutoML.
    #[must_use]
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }

    /// Sets the cached pipeline.
    #[must_use]
    pub fn with_cached_pipeline(mut self, cached_pipeline: CachedPipeline) -> Self {
        self.cached_pipeline = cached_pipeline;
        self
    }

    /// Sets the cache store.
    #[must_use]
    pub fn with_cache_store(mut self, cache_store: CacheStore) -> Self {
        self.cache_store = cache_store;
        self
    }

    /// Sets the AutoML config.
    #[must_use]
    pub fn with_automl(mut self, automl: AutoMLConfig) -> Self {
        self.automl = automl;
        self
    }
}

/// Single recomputation entry point for step annotations.
///
/// Holds only static configuration. Every call recomputes from the snapshot
/// it is given; nothing is memoized between calls.
#[derive(Debug, Clone, Default)]
pub struct PipelineCacheOrchestrator {
    search_lookup: StepTypeSearchLookup,
}

impl PipelineCacheOrchestrator {
    /// Creates an orchestrator with the default search lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an orchestrator from engine configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_search_lookup(config.search_lookup.clone())
    }

    /// Creates an orchestrator with a custom search lookup.
    #[must_use]
    pub fn with_search_lookup(search_lookup: StepTypeSearchLookup) -> Self {
        Self { search_lookup }
    }

    /// Annotates every step of the snapshot.
    #[instrument(skip_all, fields(steps = snapshot.steps.len()))]
    pub fn build(&self, snapshot: &PipelineSnapshot) -> Vec<StepAnnotation> {
        let verdict = annotate(&snapshot.steps, &snapshot.cached_pipeline);
        let covered = coverage(&snapshot.automl, &self.search_lookup);

        let annotations: Vec<StepAnnotation> = snapshot
            .steps
            .iter()
            .zip(verdict.is_cached.iter().zip(&verdict.group_type))
            .enumerate()
            .map(|(index, (step, (&is_cached, &group_type)))| StepAnnotation {
                index,
                is_cached,
                cache_data: if is_cached {
                    cache_data_for(step, &snapshot.cache_store)
                } else {
                    DistributionMap::new()
                },
                group_type,
                is_optimized_by_automl: covered.is_optimized(step.step_type),
            })
            .collect();

        debug!(
            cached = annotations.iter().filter(|a| a.is_cached).count(),
            "annotated pipeline"
        );
        annotations
    }

    /// Annotates the snapshot and rolls the result up.
    pub fn build_with_summary(
        &self,
        snapshot: &PipelineSnapshot,
    ) -> (Vec<StepAnnotation>, AnnotationSummary) {
        let annotations = self.build(snapshot);
        let summary = AnnotationSummary::from_annotations(&snapshot.steps, &annotations);
        (annotations, summary)
    }
}

fn cache_data_for(step: &StepDefinition, store: &CacheStore) -> DistributionMap {
    step.primary_output()
        .map(|output| aggregate(store.pages(output)))
        .unwrap_or_default()
}

//! Per-step annotations produced for pipeline-editing views.

use super::{DistributionMap, GroupType, StepDefinition};
use serde::{Deserialize, Serialize};

/// The derived judgment for one step of the current pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepAnnotation {
    /// Position in the current pipeline.
    pub index: usize,
    /// Whether the previously computed output can be reused.
    pub is_cached: bool,
    /// Aggregated distributions of the cached output. Empty unless cached.
    #[serde(default)]
    pub cache_data: DistributionMap,
    /// The pipeline section the step belongs to.
    pub group_type: GroupType,
    /// Whether AutoML currently searches over this step type.
    pub is_optimized_by_automl: bool,
}

/// Pipeline-level rollup of a set of annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSummary {
    /// Number of evaluated steps (pass-through markers excluded).
    pub total_steps: usize,
    /// Number of evaluated steps whose output is reusable.
    pub cached_steps: usize,
    /// First evaluated step that must be recomputed.
    pub first_invalidated: Option<usize>,
    /// Deepest reusable step; a rerun can resume after it.
    pub resume_from: Option<usize>,
}

impl AnnotationSummary {
    /// Summarizes annotations for the given steps.
    ///
    /// Annotations whose index has no step are ignored.
    #[must_use]
    pub fn from_annotations(steps: &[StepDefinition], annotations: &[StepAnnotation]) -> Self {
        let mut summary = Self::default();

        for annotation in annotations {
            let Some(step) = steps.get(annotation.index) else {
                continue;
            };
            if step.is_pass_through() {
                continue;
            }

            summary.total_steps += 1;
            if annotation.is_cached {
                summary.cached_steps += 1;
                summary.resume_from = Some(annotation.index);
            } else if summary.first_invalidated.is_none() {
                summary.first_invalidated = Some(annotation.index);
            }
        }

        summary
    }

    /// Returns true if every evaluated step can be reused.
    #[must_use]
    pub fn fully_cached(&self) -> bool {
        self.first_invalidated.is_none()
    }
}

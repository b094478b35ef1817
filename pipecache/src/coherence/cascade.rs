//! Forward-propagating cache invalidation over an ordered step list.

use super::steps_equal;
use crate::core::{CachedPipeline, GroupType, StepDefinition, StepType};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-step reuse verdicts and group classification, aligned with the steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeVerdict {
    /// Whether each step's cached output can be reused.
    pub is_cached: Vec<bool>,
    /// The pipeline section of each step.
    pub group_type: Vec<GroupType>,
}

impl CascadeVerdict {
    /// Returns the number of steps covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.is_cached.len()
    }

    /// Returns true if the verdict covers no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_cached.is_empty()
    }

    /// Returns the first evaluated step that broke the chain.
    #[must_use]
    pub fn first_invalidated(&self, steps: &[StepDefinition]) -> Option<usize> {
        self.is_cached
            .iter()
            .zip(steps)
            .position(|(cached, step)| !cached && !step.is_pass_through())
    }
}

/// Tracks how far into the pipeline sections the walk has progressed.
#[derive(Debug, Default)]
struct GroupTracker {
    seen_feature_generator: bool,
    seen_classifier_family: bool,
}

impl GroupTracker {
    fn observe(&mut self, step_type: StepType) {
        if step_type == StepType::FeatureGenerator {
            self.seen_feature_generator = true;
        }
        if step_type.is_classifier_family() {
            self.seen_classifier_family = true;
        }
    }

    fn current(&self) -> GroupType {
        if self.seen_classifier_family {
            GroupType::ModelTraining
        } else if self.seen_feature_generator {
            GroupType::FeatureExtraction
        } else {
            GroupType::Preprocessing
        }
    }
}

/// Walks `steps` once and decides which cached outputs are still reusable.
///
/// A step is reusable only if it and every evaluated step before it match the
/// cached definition at the same position. Once the chain breaks it stays
/// broken. Pass-through markers are not evaluated: they neither break the
/// chain nor report a cached output.
#[must_use]
pub fn annotate(steps: &[StepDefinition], cached: &CachedPipeline) -> CascadeVerdict {
    let mut verdict = CascadeVerdict {
        is_cached: Vec::with_capacity(steps.len()),
        group_type: Vec::with_capacity(steps.len()),
    };
    let mut chain_intact = true;
    let mut groups = GroupTracker::default();

    for (index, step) in steps.iter().enumerate() {
        if step.is_pass_through() {
            verdict.is_cached.push(false);
            verdict.group_type.push(groups.current());
            continue;
        }

        if chain_intact && !steps_equal(step, cached.get(index)) {
            debug!(index, step = %step.name, "cache chain broken");
            chain_intact = false;
        }

        groups.observe(step.step_type);
        verdict.is_cached.push(chain_intact);
        verdict.group_type.push(groups.current());
    }

    verdict
}

//! AutoML search coverage over step types.
//!
//! Coverage is display metadata only. It never influences cache reuse.

use crate::core::StepType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The optimization settings of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoMLConfig {
    /// Turns the whole search off.
    #[serde(default)]
    pub disable_automl: bool,
    /// Per-parameter search switches.
    #[serde(default)]
    pub search_flags: HashMap<String, bool>,
}

impl AutoMLConfig {
    /// Creates an enabled config with no search flags set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config with AutoML turned off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            disable_automl: true,
            search_flags: HashMap::new(),
        }
    }

    /// Sets a search flag.
    #[must_use]
    pub fn with_flag(mut self, param_name: impl Into<String>, enabled: bool) -> Self {
        self.search_flags.insert(param_name.into(), enabled);
        self
    }

    fn flag(&self, param_name: &str) -> bool {
        self.search_flags.get(param_name).copied().unwrap_or(false)
    }
}

/// Maps one search parameter to the step type it optimizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLookupEntry {
    /// The AutoML parameter name.
    pub param_name: String,
    /// The step type searched when the parameter is on.
    pub step_type: StepType,
}

/// Ordered `(param_name, step_type)` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepTypeSearchLookup {
    entries: Vec<SearchLookupEntry>,
}

impl StepTypeSearchLookup {
    /// Creates a lookup from explicit pairs.
    #[must_use]
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, StepType)>,
        S: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(param_name, step_type)| SearchLookupEntry {
                    param_name: param_name.into(),
                    step_type,
                })
                .collect(),
        }
    }

    /// Returns the entries in table order.
    #[must_use]
    pub fn entries(&self) -> &[SearchLookupEntry] {
        &self.entries
    }
}

impl Default for StepTypeSearchLookup {
    fn default() -> Self {
        Self::new([
            ("search_segmenters", StepType::Segmenter),
            ("search_transforms", StepType::Transform),
            ("search_samplers", StepType::Sampler),
            ("search_feature_generators", StepType::FeatureGenerator),
            ("search_feature_selectors", StepType::FeatureSelector),
            ("search_feature_transforms", StepType::FeatureTransform),
            ("search_classifiers", StepType::Classifier),
            ("search_training_algorithms", StepType::TrainingAlgorithm),
            ("search_validation_methods", StepType::ValidationMethod),
        ])
    }
}

/// The set of step types currently under automatic search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoMLCoverage {
    step_types: BTreeSet<StepType>,
}

impl AutoMLCoverage {
    /// Returns true if the step type is searched.
    #[must_use]
    pub fn is_optimized(&self, step_type: StepType) -> bool {
        self.step_types.contains(&step_type)
    }

    /// Returns true if nothing is searched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.step_types.is_empty()
    }

    /// Iterates the covered step types in order.
    pub fn iter(&self) -> impl Iterator<Item = StepType> + '_ {
        self.step_types.iter().copied()
    }
}

/// Resolves which step types AutoML searches for a config.
///
/// Pipeline settings are always covered while AutoML is enabled.
#[must_use]
pub fn coverage(config: &AutoMLConfig, lookup: &StepTypeSearchLookup) -> AutoMLCoverage {
    if config.disable_automl {
        return AutoMLCoverage::default();
    }

    let mut step_types = BTreeSet::from([StepType::PipelineSettings]);
    step_types.extend(
        lookup
            .entries()
            .iter()
            .filter(|entry| config.flag(&entry.param_name))
            .map(|entry| entry.step_type),
    );

    AutoMLCoverage { step_types }
}

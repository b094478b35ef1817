//! Step type and group classification enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a configured pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// The query that selects the source dataset.
    Query,
    /// Raw input data loaded outside of a query.
    InputData,
    /// Splits streams into segments.
    Segmenter,
    /// A per-sample or per-segment transform.
    Transform,
    /// A filter applied to sensor streams.
    SensorFilter,
    /// Rebalances or subsamples the data.
    Sampler,
    /// Synthesizes additional samples.
    Augmentation,
    /// A set of feature generator functions.
    FeatureGenerator,
    /// Selects a subset of generated features.
    FeatureSelector,
    /// Scales or otherwise transforms feature vectors.
    FeatureTransform,
    /// The classifier to train.
    Classifier,
    /// The algorithm used to train the classifier.
    TrainingAlgorithm,
    /// The validation method (e.g. k-fold) used during training.
    ValidationMethod,
    /// Pipeline-wide settings; a pseudo step type used for AutoML coverage.
    PipelineSettings,
    /// Session marker. Carries no artifacts and is skipped by the cascade.
    Session,
}

impl StepType {
    /// Returns true for steps that belong to the model-training family.
    #[must_use]
    pub fn is_classifier_family(&self) -> bool {
        matches!(
            self,
            Self::Classifier | Self::TrainingAlgorithm | Self::ValidationMethod
        )
    }

    /// Returns true for marker steps that are never evaluated by the cascade.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::Session)
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::InputData => write!(f, "input_data"),
            Self::Segmenter => write!(f, "segmenter"),
            Self::Transform => write!(f, "transform"),
            Self::SensorFilter => write!(f, "sensor_filter"),
            Self::Sampler => write!(f, "sampler"),
            Self::Augmentation => write!(f, "augmentation"),
            Self::FeatureGenerator => write!(f, "feature_generator"),
            Self::FeatureSelector => write!(f, "feature_selector"),
            Self::FeatureTransform => write!(f, "feature_transform"),
            Self::Classifier => write!(f, "classifier"),
            Self::TrainingAlgorithm => write!(f, "training_algorithm"),
            Self::ValidationMethod => write!(f, "validation_method"),
            Self::PipelineSettings => write!(f, "pipeline_settings"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// The section of the pipeline a step belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    /// Everything before the first feature generator.
    #[default]
    Preprocessing,
    /// From the first feature generator up to the classifier family.
    FeatureExtraction,
    /// From the first classifier-family step onwards.
    ModelTraining,
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preprocessing => write!(f, "preprocessing"),
            Self::FeatureExtraction => write!(f, "feature_extraction"),
            Self::ModelTraining => write!(f, "model_training"),
        }
    }
}

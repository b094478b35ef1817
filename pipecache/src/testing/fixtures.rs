//! Step and cache fixtures for pipeline tests.

use serde_json::json;

use crate::core::{CacheEntry, DistributionKind, FunctionSpec, StepDefinition, StepType};

/// A query step producing `temp.raw`.
#[must_use]
pub fn query_step() -> StepDefinition {
    StepDefinition::new("Q", StepType::Query)
        .with_input("query", json!("walking-sessions"))
        .with_output("temp.raw")
}

/// A transform step with parameter `x`, producing `temp.transform0`.
#[must_use]
pub fn transform_step(x: i64) -> StepDefinition {
    StepDefinition::new("Transform", StepType::Transform)
        .with_input("x", json!(x))
        .with_output("temp.transform0")
}

/// A feature generator step running the named functions in order.
#[must_use]
pub fn feature_generator_step(functions: &[&str]) -> StepDefinition {
    functions.iter().fold(
        StepDefinition::new("FeatureGen", StepType::FeatureGenerator).with_output("temp.features"),
        |step, name| {
            step.with_function(
                FunctionSpec::new(*name).with_input("columns", json!(["accel_x", "accel_y"])),
            )
        },
    )
}

/// A classifier step with a `depth` parameter, producing `temp.model`.
#[must_use]
pub fn classifier_step(depth: i64) -> StepDefinition {
    StepDefinition::new("Classifier", StepType::Classifier)
        .with_input("depth", json!(depth))
        .with_output("temp.model")
}

/// `[Q, Transform(x), FeatureGen(set=[A]), Classifier(depth)]`.
#[must_use]
pub fn scenario_pipeline(x: i64, depth: i64) -> Vec<StepDefinition> {
    vec![
        query_step(),
        transform_step(x),
        feature_generator_step(&["A"]),
        classifier_step(depth),
    ]
}

/// A cache page with the given `(kind, label, count)` triples.
#[must_use]
pub fn cache_page(filename: &str, counts: &[(DistributionKind, &str, u64)]) -> CacheEntry {
    counts
        .iter()
        .fold(CacheEntry::new(filename), |entry, (kind, label, count)| {
            entry.with_count(*kind, *label, *count)
        })
}

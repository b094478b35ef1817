//! Structural equality between a current and a cached step definition.

use crate::core::{FunctionSpec, StepDefinition};
use serde_json::{Map, Value};

/// Returns true if `cached` was produced from the same definition as `current`.
///
/// Multi-function steps compare their `set` as an ordered sequence: reordering
/// feature generators is a semantic change. All other steps compare `inputs`
/// as an unordered key/value map. Numbers compare by value, so `3` and `3.0`
/// are equal. An absent cached step is never equal.
#[must_use]
pub fn steps_equal(current: &StepDefinition, cached: Option<&StepDefinition>) -> bool {
    let Some(cached) = cached else {
        return false;
    };

    if current.name != cached.name {
        return false;
    }

    if current.set.is_empty() {
        maps_equal(&current.inputs, &cached.inputs)
    } else {
        current.set.len() == cached.set.len()
            && current.set.iter().zip(&cached.set).all(|(a, b)| functions_equal(a, b))
    }
}

fn functions_equal(a: &FunctionSpec, b: &FunctionSpec) -> bool {
    a.function_name == b.function_name && maps_equal(&a.inputs, &b.inputs)
}

fn maps_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => {
            x.as_f64() == y.as_f64()
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => maps_equal(x, y),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StepType;
    use serde_json::json;

    fn generator(functions: &[(&str, i64)]) -> StepDefinition {
        functions.iter().fold(
            StepDefinition::new("Generator Set", StepType::FeatureGenerator),
            |step, (name, value)| {
                step.with_function(FunctionSpec::new(*name).with_input("columns", json!(value)))
            },
        )
    }

    #[test]
    fn test_absent_cached_step() {
        let step = StepDefinition::new("q", StepType::Query);
        assert!(!steps_equal(&step, None));
    }

    #[test]
    fn test_name_mismatch() {
        let current = StepDefinition::new("a", StepType::Transform).with_input("x", json!(1));
        let cached = StepDefinition::new("b", StepType::Transform).with_input("x", json!(1));
        assert!(!steps_equal(&current, Some(&cached)));
    }

    #[test]
    fn test_inputs_equal_regardless_of_insertion_order() {
        let current = StepDefinition::new("t", StepType::Transform)
            .with_input("x", json!(3))
            .with_input("y", json!({"nested": [1, 2]}));
        let cached = StepDefinition::new("t", StepType::Transform)
            .with_input("y", json!({"nested": [1, 2]}))
            .with_input("x", json!(3));

        assert!(steps_equal(&current, Some(&cached)));
    }

    #[test]
    fn test_inputs_value_change() {
        let current = StepDefinition::new("t", StepType::Transform).with_input("x", json!(3));
        let cached = StepDefinition::new("t", StepType::Transform).with_input("x", json!(2));
        assert!(!steps_equal(&current, Some(&cached)));
    }

    #[test]
    fn test_inputs_extra_key() {
        let current = StepDefinition::new("t", StepType::Transform)
            .with_input("x", json!(3))
            .with_input("y", json!(null));
        let cached = StepDefinition::new("t", StepType::Transform).with_input("x", json!(3));
        assert!(!steps_equal(&current, Some(&cached)));
    }

    #[test]
    fn test_integer_equals_same_float() {
        let current = StepDefinition::new("t", StepType::Transform).with_input("x", json!(3));
        let cached = StepDefinition::new("t", StepType::Transform).with_input("x", json!(3.0));
        let moved = StepDefinition::new("t", StepType::Transform).with_input("x", json!(3.5));

        assert!(steps_equal(&current, Some(&cached)));
        assert!(steps_equal(&cached, Some(&current)));
        assert!(!steps_equal(&current, Some(&moved)));
    }

    #[test]
    fn test_nested_numbers_compare_by_value() {
        let current = StepDefinition::new("t", StepType::Transform)
            .with_input("window", json!({"sizes": [100, 200], "overlap": 0}));
        let cached = StepDefinition::new("t", StepType::Transform)
            .with_input("window", json!({"sizes": [100.0, 200.0], "overlap": 0.0}));
        assert!(steps_equal(&current, Some(&cached)));

        let current = generator(&[("Mean", 1)]);
        let cached = StepDefinition::new("Generator Set", StepType::FeatureGenerator)
            .with_function(FunctionSpec::new("Mean").with_input("columns", json!(1.0)));
        assert!(steps_equal(&current, Some(&cached)));
    }

    #[test]
    fn test_set_equal() {
        let current = generator(&[("Mean", 1), ("Variance", 2)]);
        let cached = generator(&[("Mean", 1), ("Variance", 2)]);
        assert!(steps_equal(&current, Some(&cached)));
    }

    #[test]
    fn test_set_reordered_is_not_equal() {
        let current = generator(&[("Mean", 1), ("Variance", 2)]);
        let cached = generator(&[("Variance", 2), ("Mean", 1)]);
        assert!(!steps_equal(&current, Some(&cached)));
    }

    #[test]
    fn test_set_parameter_change() {
        let current = generator(&[("Mean", 1)]);
        let cached = generator(&[("Mean", 4)]);
        assert!(!steps_equal(&current, Some(&cached)));
    }

    #[test]
    fn test_set_ignores_inputs() {
        let current = generator(&[("Mean", 1)]).with_input("group_columns", json!(["a"]));
        let cached = generator(&[("Mean", 1)]).with_input("group_columns", json!(["b"]));
        assert!(steps_equal(&current, Some(&cached)));
    }

    #[test]
    fn test_set_against_cached_without_set() {
        let current = generator(&[("Mean", 1)]);
        let cached = StepDefinition::new("Generator Set", StepType::FeatureGenerator);
        assert!(!steps_equal(&current, Some(&cached)));
    }
}

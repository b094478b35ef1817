//! Test assertions for annotations and poller state.

use crate::core::{StepAnnotation, StepDefinition};
use crate::query::{QueryActions, QueryCacheStatusPoller, QueryCacheState};

/// Asserts that cached steps form a prefix of the evaluated steps.
///
/// Pass-through markers are skipped.
pub fn assert_cached_prefix(steps: &[StepDefinition], is_cached: &[bool]) {
    let mut broken_at = None;
    for (index, (step, &cached)) in steps.iter().zip(is_cached).enumerate() {
        if step.is_pass_through() {
            continue;
        }
        match (broken_at, cached) {
            (None, false) => broken_at = Some(index),
            (Some(first), true) => panic!(
                "Step {index} ('{}') is cached after step {first} was invalidated: {is_cached:?}",
                step.name
            ),
            _ => {}
        }
    }
}

/// Asserts the `is_cached` flag of every annotation.
pub fn assert_cached_flags(annotations: &[StepAnnotation], expected: &[bool]) {
    let actual: Vec<bool> = annotations.iter().map(|a| a.is_cached).collect();
    assert_eq!(
        actual, expected,
        "Expected cached flags {expected:?}, got {actual:?}"
    );
}

/// Asserts the poller's state and enabled actions.
pub fn assert_poller_state(
    poller: &QueryCacheStatusPoller,
    state: QueryCacheState,
    actions: QueryActions,
) {
    assert_eq!(
        poller.state(),
        state,
        "Expected state {state}, got {}",
        poller.state()
    );
    assert_eq!(
        poller.actions(),
        actions,
        "Expected actions {actions:?} in state {state}, got {:?}",
        poller.actions()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StepType;

    fn steps() -> Vec<StepDefinition> {
        vec![
            StepDefinition::new("q", StepType::Query),
            StepDefinition::new("s", StepType::Session),
            StepDefinition::new("t", StepType::Transform),
        ]
    }

    #[test]
    fn test_prefix_accepts_marker_gap() {
        assert_cached_prefix(&steps(), &[true, false, true]);
        assert_cached_prefix(&steps(), &[true, false, false]);
    }

    #[test]
    #[should_panic(expected = "is cached after step 0 was invalidated")]
    fn test_prefix_rejects_gap() {
        assert_cached_prefix(&steps(), &[false, false, true]);
    }
}

//! Step definitions and the cached pipeline they are compared against.

use super::StepType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// One function inside a multi-function step (e.g. a feature generator set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// The function identity.
    pub function_name: String,
    /// Parameter values for the function.
    #[serde(default)]
    pub inputs: Map<String, Value>,
}

impl FunctionSpec {
    /// Creates a function spec with no parameters.
    #[must_use]
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            inputs: Map::new(),
        }
    }

    /// Adds a parameter value.
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }
}

/// One configured stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// The step name.
    pub name: String,
    /// The step type.
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Parameter values keyed by parameter name.
    #[serde(default)]
    pub inputs: Map<String, Value>,
    /// Ordered function set, used by multi-function steps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set: Vec<FunctionSpec>,
    /// Names of the outputs this step produces.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl StepDefinition {
    /// Creates a step with no inputs, functions or outputs.
    #[must_use]
    pub fn new(name: impl Into<String>, step_type: StepType) -> Self {
        Self {
            name: name.into(),
            step_type,
            inputs: Map::new(),
            set: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Adds an input value.
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }

    /// Appends a function to the step's set.
    #[must_use]
    pub fn with_function(mut self, function: FunctionSpec) -> Self {
        self.set.push(function);
        self
    }

    /// Appends an output name.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.outputs.push(output.into());
        self
    }

    /// Returns the output whose cache pages describe this step.
    #[must_use]
    pub fn primary_output(&self) -> Option<&str> {
        self.outputs.first().map(String::as_str)
    }

    /// Returns true if this step is a pass-through marker.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.step_type.is_pass_through()
    }
}

/// The step list captured when cached artifacts were produced.
///
/// Positions are aligned with the current pipeline. A slot is `None` when the
/// snapshot held something that could not be decoded as a step.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct CachedPipeline {
    steps: Vec<Option<StepDefinition>>,
}

impl CachedPipeline {
    /// Creates a cached pipeline from decoded steps.
    #[must_use]
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        steps.into_iter().collect()
    }

    /// Decodes a raw snapshot, keeping malformed entries as absent slots.
    ///
    /// Anything other than a JSON array yields an empty pipeline.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let Some(items) = value.as_array() else {
            debug!("cached pipeline snapshot is not an array; treating as empty");
            return Self::default();
        };

        let steps = items
            .iter()
            .enumerate()
            .map(|(index, item)| match StepDefinition::deserialize(item) {
                Ok(step) => Some(step),
                Err(e) => {
                    debug!(index, error = %e, "dropping malformed cached step");
                    None
                }
            })
            .collect();

        Self { steps }
    }

    /// Returns the cached step at a position, if one was decoded there.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index).and_then(Option::as_ref)
    }

    /// Returns the number of slots, including absent ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the snapshot holds no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl From<Value> for CachedPipeline {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

impl FromIterator<StepDefinition> for CachedPipeline {
    fn from_iter<I: IntoIterator<Item = StepDefinition>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().map(Some).collect(),
        }
    }
}
